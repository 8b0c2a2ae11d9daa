//! Typed argument binding.
//!
//! A leaf command is built from a closure whose parameter list is its
//! signature: `|out: &mut Output, host: String, port: u16| ...` declares a
//! command taking exactly two arguments. The [`Handler`] trait captures that
//! signature statically; at dispatch time each token is converted with
//! [`FromToken`] and any failed conversion turns the whole line into a
//! non-match.

use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::output::Output;

/// Error returned by a failing handler.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// A handler call with its arguments already converted.
pub(crate) type Invocation = Box<dyn FnOnce(&mut Output) -> Result<(), HandlerError> + Send>;

/// Conversion from one command-line token into a typed value.
pub trait FromToken: Sized + Send + 'static {
    /// Name shown in help output for this parameter position.
    const TYPE_NAME: &'static str;

    /// Convert a token, or `None` if it is not a valid value.
    fn from_token(token: &str) -> Option<Self>;
}

macro_rules! parse_from_token {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromToken for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_token(token: &str) -> Option<Self> {
                    token.parse().ok()
                }
            }
        )*
    };
}

parse_from_token! {
    i8 => "<i8>",
    i16 => "<i16>",
    i32 => "<i32>",
    i64 => "<i64>",
    i128 => "<i128>",
    isize => "<isize>",
    u8 => "<u8>",
    u16 => "<u16>",
    u32 => "<u32>",
    u64 => "<u64>",
    u128 => "<u128>",
    usize => "<usize>",
    f32 => "<f32>",
    f64 => "<f64>",
}

impl FromToken for bool {
    const TYPE_NAME: &'static str = "<bool>";

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl FromToken for char {
    const TYPE_NAME: &'static str = "<char>";

    fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl FromToken for String {
    const TYPE_NAME: &'static str = "<string>";

    fn from_token(token: &str) -> Option<Self> {
        Some(token.to_string())
    }
}

/// Values a handler may return.
pub trait IntoCommandResult {
    fn into_command_result(self) -> Result<(), HandlerError>;
}

impl IntoCommandResult for () {
    fn into_command_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> IntoCommandResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_command_result(self) -> Result<(), HandlerError> {
        self.map_err(Into::into)
    }
}

/// A closure usable as a fixed-arity command handler.
///
/// Implemented for `Fn(&mut Output, A1, .., An) -> R` with up to six
/// arguments, where every `Ai: FromToken` and `R: IntoCommandResult`.
/// `Args` is the tuple of argument types and only serves to select the impl.
pub trait Handler<Args>: Send + Sync + Sized + 'static {
    /// Help names of the parameters, in order. Its length is the arity.
    fn type_names() -> Vec<&'static str>;

    /// Convert `tokens` into arguments and package the call, or `None` on
    /// an arity or conversion mismatch.
    fn bind(handler: &Arc<Self>, tokens: &[String]) -> Option<Invocation>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Handler<($($arg,)*)> for F
        where
            F: Fn(&mut Output, $($arg),*) -> R + Send + Sync + 'static,
            R: IntoCommandResult,
            $($arg: FromToken,)*
        {
            fn type_names() -> Vec<&'static str> {
                vec![$($arg::TYPE_NAME),*]
            }

            #[allow(non_snake_case)]
            fn bind(handler: &Arc<Self>, tokens: &[String]) -> Option<Invocation> {
                let mut tokens = tokens.iter();
                $(let $arg = $arg::from_token(tokens.next()?)?;)*
                if tokens.next().is_some() {
                    return None;
                }
                let handler = Arc::clone(handler);
                Some(Box::new(move |out: &mut Output| {
                    (*handler)(out, $($arg),*).into_command_result()
                }))
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);

/// Type-erased handler stored in the command tree.
pub(crate) trait Binding: Send + Sync {
    /// Help names of the parameters.
    fn type_names(&self) -> Vec<&'static str>;

    fn bind(&self, tokens: &[String]) -> Option<Invocation>;
}

struct Typed<H, Args> {
    handler: Arc<H>,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> Binding for Typed<H, Args>
where
    H: Handler<Args>,
    Args: 'static,
{
    fn type_names(&self) -> Vec<&'static str> {
        H::type_names()
    }

    fn bind(&self, tokens: &[String]) -> Option<Invocation> {
        H::bind(&self.handler, tokens)
    }
}

/// Erase a fixed-arity handler.
pub(crate) fn typed<Args, H>(handler: H) -> Arc<dyn Binding>
where
    Args: 'static,
    H: Handler<Args>,
{
    Arc::new(Typed {
        handler: Arc::new(handler),
        _args: PhantomData,
    })
}

struct Freeform<F, R> {
    handler: Arc<F>,
    _result: PhantomData<fn() -> R>,
}

impl<F, R> Binding for Freeform<F, R>
where
    F: Fn(&mut Output, Vec<String>) -> R + Send + Sync + 'static,
    R: IntoCommandResult + 'static,
{
    fn type_names(&self) -> Vec<&'static str> {
        vec!["<list of strings>"]
    }

    fn bind(&self, tokens: &[String]) -> Option<Invocation> {
        let handler = Arc::clone(&self.handler);
        let args = tokens.to_vec();
        Some(Box::new(move |out: &mut Output| {
            (*handler)(out, args).into_command_result()
        }))
    }
}

/// Erase a handler taking all trailing tokens.
pub(crate) fn freeform<F, R>(handler: F) -> Arc<dyn Binding>
where
    F: Fn(&mut Output, Vec<String>) -> R + Send + Sync + 'static,
    R: IntoCommandResult + 'static,
{
    Arc::new(Freeform {
        handler: Arc::new(handler),
        _result: PhantomData,
    })
}
