//! Exit-path audit of lowered stubs.
//!
//! Every path through a stub body is walked, including the exceptional edge
//! from each [`Stmt::Call`] to every handler of the innermost enclosing
//! `try`. A stub is clean when, on every exit, each slot it acquired was
//! released or transferred exactly once.

use std::fmt;

use super::ir::{ExitKind, SlotId, Stmt, StubIr};

/// Resource accounting for one exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPath {
    pub kind: ExitKind,
    pub acquired: usize,
    pub released: usize,
    pub transferred: usize,
    /// Slots still held at the exit.
    pub leaked: Vec<SlotId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Leak { slot: SlotId, exit: ExitKind },
    DoubleAcquire { slot: SlotId },
    /// Released while not held, including a second release.
    ReleaseUnheld { slot: SlotId },
    TransferUnheld { slot: SlotId },
    /// A native exception can leave the stub.
    Unwind,
    /// A non-void stub can reach the end of its body.
    FallsOffEnd,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Leak { slot, exit } => write!(f, "slot {slot} leaks on {exit:?} exit"),
            Violation::DoubleAcquire { slot } => write!(f, "slot {slot} acquired twice"),
            Violation::ReleaseUnheld { slot } => write!(f, "slot {slot} released while not held"),
            Violation::TransferUnheld { slot } => {
                write!(f, "slot {slot} transferred while not held")
            }
            Violation::Unwind => write!(f, "native exception escapes the stub"),
            Violation::FallsOffEnd => write!(f, "non-void stub reaches end without return"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub paths: Vec<ExitPath>,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn paths_of(&self, kind: ExitKind) -> impl Iterator<Item = &ExitPath> {
        self.paths.iter().filter(move |p| p.kind == kind)
    }
}

#[derive(Debug, Clone, Default)]
struct PathState {
    held: Vec<SlotId>,
    acquired: usize,
    released: usize,
    transferred: usize,
}

struct Auditor {
    report: AuditReport,
    /// States at each throwing call, one frame per enclosing `try`.
    frames: Vec<Vec<PathState>>,
}

impl Auditor {
    fn violation(&mut self, violation: Violation) {
        if !self.report.violations.contains(&violation) {
            self.report.violations.push(violation);
        }
    }

    fn exit(&mut self, kind: ExitKind, state: PathState) {
        for &slot in &state.held {
            self.violation(Violation::Leak { slot, exit: kind });
        }
        self.report.paths.push(ExitPath {
            kind,
            acquired: state.acquired,
            released: state.released,
            transferred: state.transferred,
            leaked: state.held,
        });
    }

    /// Walk `stmts` from each of `states`; returns the states that fall through.
    fn walk(&mut self, stmts: &[Stmt], mut states: Vec<PathState>) -> Vec<PathState> {
        for stmt in stmts {
            if states.is_empty() {
                break;
            }
            let mut next = Vec::with_capacity(states.len());
            for state in states {
                next.extend(self.step(stmt, state));
            }
            states = next;
        }
        states
    }

    fn step(&mut self, stmt: &Stmt, mut state: PathState) -> Vec<PathState> {
        match stmt {
            Stmt::Line(_) | Stmt::Throw { .. } => vec![state],
            Stmt::Acquire { slot, on_failure } => {
                let mut out = if on_failure.is_empty() {
                    Vec::new()
                } else {
                    self.walk(on_failure, vec![state.clone()])
                };
                if state.held.contains(slot) {
                    self.violation(Violation::DoubleAcquire { slot: *slot });
                } else {
                    state.held.push(*slot);
                    state.acquired += 1;
                }
                out.push(state);
                out
            }
            Stmt::Release { slot, .. } => {
                match state.held.iter().position(|s| s == slot) {
                    Some(pos) => {
                        state.held.remove(pos);
                        state.released += 1;
                    }
                    None => self.violation(Violation::ReleaseUnheld { slot: *slot }),
                }
                vec![state]
            }
            Stmt::Transfer { slot, .. } => {
                match state.held.iter().position(|s| s == slot) {
                    Some(pos) => {
                        state.held.remove(pos);
                        state.transferred += 1;
                    }
                    None => self.violation(Violation::TransferUnheld { slot: *slot }),
                }
                vec![state]
            }
            Stmt::Call(_) => {
                match self.frames.last_mut() {
                    Some(frame) => frame.push(state.clone()),
                    None => {
                        self.violation(Violation::Unwind);
                        self.exit(ExitKind::Unwind, state.clone());
                    }
                }
                vec![state]
            }
            Stmt::If { body, .. } => {
                let mut out = self.walk(body, vec![state.clone()]);
                out.push(state);
                out
            }
            Stmt::Try { body, handlers } => {
                self.frames.push(Vec::new());
                let mut out = self.walk(body, vec![state]);
                let thrown = self.frames.pop().unwrap_or_default();
                // Exceptions thrown inside a handler belong to the enclosing frame.
                for handler in handlers {
                    out.extend(self.walk(&handler.body, thrown.clone()));
                }
                out
            }
            Stmt::Return { kind, .. } => {
                self.exit(*kind, state);
                Vec::new()
            }
        }
    }
}

/// Audit every exit path of `stub`.
pub fn audit(stub: &StubIr) -> AuditReport {
    let mut auditor = Auditor {
        report: AuditReport::default(),
        frames: Vec::new(),
    };
    let remaining = auditor.walk(&stub.body, vec![PathState::default()]);
    if !remaining.is_empty() && !stub.returns_void() {
        auditor.violation(Violation::FallsOffEnd);
    }
    for state in remaining {
        auditor.exit(ExitKind::Normal, state);
    }
    auditor.report
}
