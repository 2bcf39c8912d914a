//! Scenario tests for FlakeId generation
