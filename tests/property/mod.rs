//! Property tests for the decision walk

mod decision_walk;
