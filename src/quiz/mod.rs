// src/quiz/mod.rs

pub mod controller;
pub mod registry;
pub mod session;

pub use controller::QuizController;
pub use registry::QuizRegistry;
pub use session::{Phase, QuizRequest, QuizSession, QuizView, ReviewItem};
