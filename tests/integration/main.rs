//! End-to-end crawl tests over real HTTP

mod crawl_tests;
