//! One DNS question/answer round trip with the configured server.
//!
//! The query socket comes from the [`SocketFactory`], so lookups are
//! protected exactly like the connections they precede. UDP is tried
//! first; a truncated answer is retried once over TCP using the two-byte
//! length prefix from RFC 1035 §4.2.2.

use crate::base::context::IoResultExt;
use crate::base::network::Network;
use crate::base::neterror::NetError;
use crate::socket::factory::SocketFactory;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Receive buffer for UDP answers.
const MAX_UDP_RESPONSE: usize = 4096;

/// An encoded question and the id its answer must carry.
#[derive(Debug)]
pub(crate) struct DnsRequest {
    id: u16,
    bytes: Vec<u8>,
}

impl DnsRequest {
    /// Encodes a recursive query for `host`.
    pub(crate) fn new(host: &str, record_type: RecordType) -> io::Result<Self> {
        let fqdn = if host.ends_with('.') {
            host.to_string()
        } else {
            format!("{host}.")
        };
        let name = Name::from_ascii(&fqdn)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        message.add_query(Query::query(name, record_type));

        let bytes = message
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        Ok(Self { id, bytes })
    }

    pub(crate) fn id(&self) -> u16 {
        self.id
    }

    /// Whether `bytes` decode to the answer for this request.
    fn answer_from(&self, bytes: &[u8]) -> Option<Message> {
        match Message::from_bytes(bytes) {
            Ok(msg) if msg.id() == self.id && msg.message_type() == MessageType::Response => {
                Some(msg)
            }
            Ok(msg) => {
                tracing::trace!(
                    expected = self.id,
                    got = msg.id(),
                    "discarding unrelated dns message"
                );
                None
            }
            Err(e) => {
                tracing::trace!(error = %e, "discarding malformed dns message");
                None
            }
        }
    }
}

/// Sends questions to a single DNS server over protected sockets.
pub(crate) struct DnsExchange<'a> {
    factory: &'a SocketFactory,
    server: SocketAddr,
    timeout: Duration,
    tcp_fallback: bool,
}

impl<'a> DnsExchange<'a> {
    pub(crate) fn new(
        factory: &'a SocketFactory,
        server: SocketAddr,
        timeout: Duration,
        tcp_fallback: bool,
    ) -> Self {
        Self {
            factory,
            server,
            timeout,
            tcp_fallback,
        }
    }

    /// Asks for `record_type` records of `host` and returns the matching
    /// addresses in answer order. `query` labels any error.
    ///
    /// An empty list means the name exists but has no records of that type.
    pub(crate) async fn lookup(
        &self,
        host: &str,
        record_type: RecordType,
        query: &str,
    ) -> Result<Vec<IpAddr>, NetError> {
        let request = DnsRequest::new(host, record_type).dns_context(query)?;
        tracing::debug!(
            host,
            ?record_type,
            server = %self.server,
            id = request.id(),
            "sending dns query"
        );

        let mut response = self.bounded(self.exchange_udp(&request, query), query).await?;
        if response.truncated() && self.tcp_fallback {
            tracing::debug!(host, server = %self.server, "dns answer truncated, retrying over tcp");
            response = self.bounded(self.exchange_tcp(&request, query), query).await?;
        }

        let addrs = addresses(&response, record_type).dns_context(query)?;
        tracing::debug!(host, ?record_type, count = addrs.len(), "dns answer received");
        Ok(addrs)
    }

    async fn bounded<F>(&self, exchange: F, query: &str) -> Result<Message, NetError>
    where
        F: std::future::Future<Output = Result<Message, NetError>>,
    {
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(|e| as_resolution_error(e, query)),
            Err(_) => Err(NetError::dns_failed(
                query,
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no answer from {} within {:?}", self.server, self.timeout),
                ),
            )),
        }
    }

    async fn exchange_udp(&self, request: &DnsRequest, query: &str) -> Result<Message, NetError> {
        let network = Network::udp_for(&self.server);
        let mut conn = self
            .factory
            .create_protected(network, self.server.into(), None)
            .await?;
        conn.write_all(&request.bytes).await.dns_context(query)?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE];
        loop {
            let n = conn.read(&mut buf).await.dns_context(query)?;
            if let Some(msg) = request.answer_from(&buf[..n]) {
                return Ok(msg);
            }
        }
    }

    async fn exchange_tcp(&self, request: &DnsRequest, query: &str) -> Result<Message, NetError> {
        let network = Network::tcp_for(&self.server);
        let mut conn = self
            .factory
            .create_protected(network, self.server.into(), None)
            .await?;

        let len = u16::try_from(request.bytes.len()).map_err(|_| {
            NetError::dns_failed(
                query,
                io::Error::new(io::ErrorKind::InvalidInput, "query too large"),
            )
        })?;
        let mut framed = Vec::with_capacity(request.bytes.len() + 2);
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(&request.bytes);
        conn.write_all(&framed).await.dns_context(query)?;

        let mut len = [0u8; 2];
        conn.read_exact(&mut len).await.dns_context(query)?;
        let mut buf = vec![0u8; u16::from_be_bytes(len) as usize];
        conn.read_exact(&mut buf).await.dns_context(query)?;

        request.answer_from(&buf).ok_or_else(|| {
            NetError::dns_failed(
                query,
                io::Error::new(io::ErrorKind::InvalidData, "unexpected dns answer over tcp"),
            )
        })
    }
}

/// A DNS server that refused or dropped the connection gave no answer.
fn as_resolution_error(err: NetError, query: &str) -> NetError {
    match err {
        NetError::ConnectionFailed { source, .. } => NetError::NameNotResolved {
            query: query.to_string(),
            source,
        },
        other => other,
    }
}

/// Extracts addresses of `record_type` from an answer, skipping CNAMEs and
/// any other record types.
fn addresses(response: &Message, record_type: RecordType) -> io::Result<Vec<IpAddr>> {
    match response.response_code() {
        ResponseCode::NoError => {}
        ResponseCode::NXDomain => {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such host"));
        }
        code => {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("dns server returned {code:?}"),
            ));
        }
    }

    Ok(response
        .answers()
        .iter()
        .filter_map(|record| match (record.data(), record_type) {
            (RData::A(a), RecordType::A) => Some(IpAddr::V4(a.0)),
            (RData::AAAA(aaaa), RecordType::AAAA) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect())
}
