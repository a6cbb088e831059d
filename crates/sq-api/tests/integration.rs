mod common;

mod flow_tests;
mod health_tests;
