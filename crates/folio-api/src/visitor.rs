//! Derives the [`VisitContext`] of a public page view from its request.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use folio_core::visit::VisitContext;
use sha2::{Digest, Sha256};

pub const SESSION_HEADER: &str = "x-session-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Who is reading. Never rejects; every attribute is optional.
#[derive(Debug, Clone, Default)]
pub struct Visitor(pub VisitContext);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

/// The first address in `X-Forwarded-For`, else the peer address.
fn origin(parts: &Parts) -> Option<String> {
  let forwarded = header_str(&parts.headers, FORWARDED_FOR_HEADER)
    .and_then(|v| v.split(',').next())
    .map(str::trim)
    .filter(|v| !v.is_empty());
  match forwarded {
    Some(addr) => Some(addr.to_owned()),
    None => parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip().to_string()),
  }
}

pub fn hash_origin(origin: &str) -> String { hex::encode(Sha256::digest(origin.as_bytes())) }

impl<S> FromRequestParts<S> for Visitor
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
    let headers = &parts.headers;
    Ok(Visitor(VisitContext {
      session_id:  header_str(headers, SESSION_HEADER).map(str::to_owned),
      origin_hash: origin(parts).as_deref().map(hash_origin),
      user_agent:  header_str(headers, header::USER_AGENT.as_str()).map(str::to_owned),
      referrer:    header_str(headers, header::REFERER.as_str()).map(str::to_owned),
    }))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  async fn visitor(req: Request<()>) -> VisitContext {
    let (mut parts, _) = req.into_parts();
    Visitor::from_request_parts(&mut parts, &()).await.unwrap().0
  }

  #[tokio::test]
  async fn reads_headers() {
    let req = Request::builder()
      .header(SESSION_HEADER, "abc")
      .header(FORWARDED_FOR_HEADER, "203.0.113.7, 10.0.0.1")
      .header(header::USER_AGENT, "curl/8")
      .header(header::REFERER, "https://example.org/")
      .body(())
      .unwrap();
    let ctx = visitor(req).await;

    assert_eq!(ctx.session_id.as_deref(), Some("abc"));
    assert_eq!(ctx.origin_hash, Some(hash_origin("203.0.113.7")));
    assert_eq!(ctx.user_agent.as_deref(), Some("curl/8"));
    assert_eq!(ctx.referrer.as_deref(), Some("https://example.org/"));
  }

  #[tokio::test]
  async fn falls_back_to_peer_address() {
    let mut req = Request::builder().body(()).unwrap();
    let peer: SocketAddr = "198.51.100.2:4000".parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    let ctx = visitor(req).await;

    assert_eq!(ctx.session_id, None);
    assert_eq!(ctx.origin_hash, Some(hash_origin("198.51.100.2")));
    assert_eq!(ctx.origin_hash.as_ref().map(String::len), Some(64));
  }

  #[tokio::test]
  async fn empty_request_has_nothing() {
    let ctx = visitor(Request::builder().body(()).unwrap()).await;
    assert_eq!(ctx, VisitContext::default());
  }
}
