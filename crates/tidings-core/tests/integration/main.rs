//! Integration tests for tidings-core
//!
//! Uses wiremock to stand in for the headlines API and the Firebase REST
//! endpoints, and drives the real clients and state holders against them.

mod common;

mod test_firebase;
mod test_headlines;
mod test_news_api;
