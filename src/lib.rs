//! # Vestibule (Multi-tenant Authentication & Sessions)
//!
//! `vestibule` is the authentication backend for a multi-tenant content
//! platform. It issues rotating access/refresh tokens, binds sessions to a
//! device fingerprint, and gates administration endpoints by role.
//!
//! ## Tenant Model (Namespaces)
//!
//! Every route is prefixed by a tenant namespace segment. A namespace is a
//! validated, lowercased identifier (`[a-z0-9_-]`); store access is scoped
//! to exactly one namespace, resolved per request, and tenants are never
//! queried cross-namespace.
//!
//! ## Sessions
//!
//! Each account has at most one active session. Login overwrites the stored
//! refresh token and device fingerprint; refresh rotates both; logout clears
//! them, so a stale refresh token can never be replayed. Tokens travel
//! inside an authenticated ChaCha20-Poly1305 envelope, either as a bearer
//! header or as an httponly cookie.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;
