//! Database entities.

#![allow(missing_docs)]

pub mod answer;
pub mod answer_vote;
pub mod question;
pub mod question_tag;
pub mod question_vote;
pub mod tag;
pub mod user;
pub mod user_profile;

pub use answer::Entity as Answer;
pub use answer_vote::Entity as AnswerVote;
pub use question::Entity as Question;
pub use question_tag::Entity as QuestionTag;
pub use question_vote::Entity as QuestionVote;
pub use tag::Entity as Tag;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
