//! Integration Tests Module
//!
//! End-to-end tests across the codec, proxy, RPC client and detector.
