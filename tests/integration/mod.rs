//! Integration tests for course tree modeling, storage and generation

mod codec_scenarios;
mod population;
mod service_flow;
mod support;
