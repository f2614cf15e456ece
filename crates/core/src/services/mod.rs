//! Business logic services.

#![allow(missing_docs)]

pub mod answer;
pub mod mail;
pub mod pagination;
pub mod question;
pub mod tag;
pub mod user;
pub mod vote;

pub use answer::{AnswerService, PostAnswerInput};
pub use mail::{LogMailer, MailMessage, MailService, Mailer, SmtpMailer, mailer_from_config};
pub use pagination::{Page, PageNumber, PageWindow};
pub use question::{
    AskQuestionInput, QuestionDetail, QuestionListItem, QuestionService, SearchQuery,
};
pub use tag::{MAX_TAG_LEN, MAX_TAGS, parse_tags};
pub use user::{
    Account, AvatarUpload, DEFAULT_AVATAR_URL, LoginInput, MAX_AVATAR_BYTES, RegisterInput,
    Session, SettingsInput, UserService, avatar_url, validate_avatar,
};
pub use vote::{VoteDirection, VoteService, VoteValue};
