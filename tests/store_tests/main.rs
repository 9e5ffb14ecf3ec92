//! Store Tests
