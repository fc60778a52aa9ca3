// Test module entry point for photo manifest tests
// All listing, reconciliation and quarantine tests organized here

mod manager_tests;
mod quarantine_tests;
