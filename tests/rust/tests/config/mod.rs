//! Configuration tests
//!
//! Loading configuration files from disk and wiring the result into the
//! pool and cache.

mod loading;
