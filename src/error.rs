use thiserror::Error;

use crate::analyzer::ParseError;
use crate::dispatcher::DeliveryError;
use crate::eval::EvalError;
use crate::registry::RegistryError;
use crate::selector::SelectorError;
use crate::tokenizer::TokenizerError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("selector error: {0}")]
    Selector(#[from] SelectorError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
