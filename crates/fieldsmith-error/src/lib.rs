use std::fmt::{self, Debug, Display};

pub use self::ext::ResultExt;

mod ext;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[macro_export]
macro_rules! bail {
    ($(type = $type:expr,)? $msg:expr) => {
        return Err($crate::fieldsmith_error!($(type = $type,)? $msg));
    };
}

#[macro_export]
macro_rules! fieldsmith_error {
    (type = $type:expr, $msg:expr) => {
        $crate::Error::msg($msg).with_error_type($type)
    };
    ($msg:expr) => {
        $crate::fieldsmith_error!(type = $crate::ErrorType::Other(None), $msg)
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorType {
    /// Bad or missing input rejected at submission time
    Validation(Option<String>),
    /// The workspace is not entitled to run automations
    Entitlement(Option<String>),
    NotFound,
    /// The operation does not apply to the entity's current lifecycle state
    InvalidState(Option<String>),
    /// The remote system rejected the login
    Authentication,
    /// No valid security code arrived within the deadline
    TwoFactorTimeout,
    /// A single remote field interaction failed; swallowed and logged per field
    RemoteInteraction,
    /// Internal queue/state bug; must never be silently ignored
    InvariantViolation,
    Other(Option<String>),
}

#[derive(Debug)]
pub struct Error {
    ty: ErrorType,
    inner: eyre::Report,
}

impl Error {
    #[inline]
    pub fn new<E>(ty: ErrorType, err: E) -> Self
    where
        E: Into<eyre::Report>,
    {
        Self {
            ty,
            inner: err.into(),
        }
    }

    #[inline]
    pub fn msg<M>(msg: M) -> Self
    where
        M: Debug + Display + Send + Sync + 'static,
    {
        eyre::Report::msg(msg).into()
    }

    #[must_use]
    pub fn error_type(&self) -> &ErrorType {
        &self.ty
    }

    pub fn error(&self) -> &eyre::Report {
        &self.inner
    }

    #[must_use]
    pub fn with_error_type(self, ty: ErrorType) -> Self {
        Self { ty, ..self }
    }
}

impl<T> From<T> for Error
where
    T: Into<eyre::Report>,
{
    fn from(value: T) -> Self {
        Self {
            ty: ErrorType::Other(None),
            inner: value.into(),
        }
    }
}

impl From<Error> for BoxError {
    fn from(value: Error) -> Self {
        BoxError::from(value.inner)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <eyre::Report as fmt::Display>::fmt(&self.inner, f)
    }
}
