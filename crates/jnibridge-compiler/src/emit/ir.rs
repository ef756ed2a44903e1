//! Statement-level representation of a stub body.
//!
//! Stubs are lowered to this form before rendering so that resource handling
//! can be checked structurally (see [`audit`](super::audit)) instead of by
//! inspecting generated text.

use jnibridge_core::PrimitiveKind;

/// Index into [`StubIr::slots`].
pub type SlotId = usize;

/// What a slot holds and therefore how it is acquired and released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `GetStringUTFChars` / `ReleaseStringUTFChars`.
    StringChars,
    /// `Get<T>ArrayElements` / `Release<T>ArrayElements`.
    ArrayElements(PrimitiveKind),
    /// `NewGlobalRef` / `DeleteGlobalRef`.
    GlobalRef,
    /// A `jstring` created for the return value.
    LocalString,
    /// A primitive array created for the return value.
    LocalArray(PrimitiveKind),
}

/// One resource a stub acquires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// The native variable holding the resource.
    pub var: String,
    /// The expression it was acquired from.
    pub source: String,
    pub kind: ResourceKind,
    /// `source` may be null: acquisition and release are skipped for a null
    /// source, and the variable is null too.
    pub nullable: bool,
}

/// How array elements are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseMode {
    /// Mode `0`: copy back and free.
    Commit,
    /// `JNI_ABORT`: free without copying back.
    Abort,
}

/// Why a stub returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitKind {
    Normal,
    NullArgument,
    AcquireFailed,
    NativeException,
    /// A C++ exception leaves the stub uncaught.
    Unwind,
}

/// What a `return` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnValue {
    /// `return;` in a `void` stub.
    Void,
    /// `jnibridge::defaultReturn<T>()`; the JVM ignores it when an
    /// exception is pending.
    Default,
    Expr(String),
}

/// Which exceptions a handler catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchKind {
    /// `catch (const std::exception& e)`.
    Std,
    /// `catch (...)`.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub catch: CatchKind,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// A statement that neither throws nor exits.
    Line(String),
    /// Acquire a slot. A non-empty `on_failure` runs, with the slot not
    /// held, when the JNI call returns null.
    Acquire { slot: SlotId, on_failure: Vec<Stmt> },
    Release { slot: SlotId, mode: ReleaseMode },
    /// Hand the resource to someone else: a RAII wrapper (`into`) or the caller.
    Transfer { slot: SlotId, into: Option<String> },
    /// The call into user code. The only statement that may throw.
    Call(String),
    If { condition: String, body: Vec<Stmt> },
    Try { body: Vec<Stmt>, handlers: Vec<Handler> },
    /// Raise a Java exception. Does not exit.
    Throw { class: String, message: String },
    Return { value: ReturnValue, kind: ExitKind },
}

/// A lowered stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubIr {
    pub symbol: String,
    pub jni_return: String,
    /// `(type, name)`; an empty name leaves the parameter unnamed.
    pub params: Vec<(String, String)>,
    pub slots: Vec<Slot>,
    pub body: Vec<Stmt>,
}

impl StubIr {
    pub fn returns_void(&self) -> bool {
        self.jni_return == "void"
    }

    /// Count statements of each resource operation, for diagnostics.
    pub fn count(&self, pred: impl Fn(&Stmt) -> bool + Copy) -> usize {
        fn walk(stmts: &[Stmt], pred: impl Fn(&Stmt) -> bool + Copy) -> usize {
            stmts
                .iter()
                .map(|s| {
                    let nested = match s {
                        Stmt::If { body, .. } | Stmt::Acquire { on_failure: body, .. } => {
                            walk(body, pred)
                        }
                        Stmt::Try { body, handlers } => {
                            walk(body, pred) + handlers.iter().map(|h| walk(&h.body, pred)).sum::<usize>()
                        }
                        _ => 0,
                    };
                    usize::from(pred(s)) + nested
                })
                .sum()
        }
        walk(&self.body, pred)
    }
}
