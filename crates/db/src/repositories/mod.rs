//! Repositories over the database entities.

pub mod answer;
pub mod ordering;
pub mod question;
pub mod tag;
pub mod user;
pub mod user_profile;
pub mod vote;

pub use answer::{AnswerRepository, AnswerSummary};
pub use ordering::{ListOrder, RankKey};
pub use question::{QuestionFilter, QuestionRepository, QuestionSummary};
pub use tag::TagRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
pub use vote::{VoteKind, VoteOutcome, VoteRepository};
