mod common;
mod offer_tests;
