mod bulk_tests;
mod registry_tests;
mod support;
mod tester_tests;
