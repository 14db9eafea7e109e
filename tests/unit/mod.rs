//! Unit tests for the public building blocks: wire codec, correlator,
//! skin type data and product search
mod correlator_tests;
mod domain_tests;
mod protocol_tests;
