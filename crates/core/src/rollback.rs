//! Compensating actions for multi-step writes that span the filesystem and
//! the catalog.
//!
//! Each side effect registers its undo step once it has completed. If the
//! operation finishes, [`Rollback::commit`] discards the stack; otherwise
//! [`Rollback::unwind`], or dropping the guard on an early return via `?`,
//! runs the steps newest-first.
//! Undo failures are logged and never replace the error being returned.

use tracing::{debug, warn};

type UndoFn<'a> = Box<dyn FnOnce() -> std::io::Result<()> + 'a>;

#[must_use = "dropping a Rollback immediately undoes everything registered on it"]
pub struct Rollback<'a> {
    operation: &'static str,
    steps: Vec<(&'static str, UndoFn<'a>)>,
}

impl<'a> Rollback<'a> {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            steps: Vec::new(),
        }
    }

    /// Register the undo step for a side effect that just completed.
    pub fn push(
        &mut self,
        label: &'static str,
        undo: impl FnOnce() -> std::io::Result<()> + 'a,
    ) {
        self.steps.push((label, Box::new(undo)));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.steps.len()
    }

    /// The operation completed; keep every side effect.
    pub fn commit(mut self) {
        self.steps.clear();
    }

    /// Run every registered undo step, newest first. Returns how many failed.
    pub fn unwind(mut self) -> usize {
        self.run()
    }

    fn run(&mut self) -> usize {
        let mut failures = 0;
        while let Some((label, undo)) = self.steps.pop() {
            match undo() {
                Ok(()) => debug!(operation = self.operation, step = label, "rolled back"),
                Err(e) => {
                    failures += 1;
                    warn!(
                        operation = self.operation,
                        step = label,
                        error = %e,
                        "rollback step failed; manual cleanup may be required"
                    );
                }
            }
        }
        failures
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.steps.is_empty() {
            self.run();
        }
    }
}

/// Remove a file written by an interrupted operation. A file that was never
/// created counts as removed.
pub fn remove_file_if_present(path: &std::path::Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_unwind_runs_in_reverse_order() {
        let order = RefCell::new(Vec::new());
        let mut rollback = Rollback::new("test");
        rollback.push("first", || {
            order.borrow_mut().push(1);
            Ok(())
        });
        rollback.push("second", || {
            order.borrow_mut().push(2);
            Ok(())
        });
        assert_eq!(rollback.len(), 2);
        assert_eq!(rollback.unwind(), 0);
        assert_eq!(*order.borrow(), vec![2, 1]);
    }

    #[test]
    fn test_commit_discards_steps() {
        let ran = RefCell::new(false);
        let mut rollback = Rollback::new("test");
        rollback.push("step", || {
            *ran.borrow_mut() = true;
            Ok(())
        });
        rollback.commit();
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_drop_unwinds() {
        let ran = RefCell::new(0);
        {
            let mut rollback = Rollback::new("test");
            rollback.push("step", || {
                *ran.borrow_mut() += 1;
                Ok(())
            });
        }
        assert_eq!(*ran.borrow(), 1);
    }

    #[test]
    fn test_failed_step_does_not_stop_the_rest() {
        let ran = RefCell::new(Vec::new());
        let mut rollback = Rollback::new("test");
        rollback.push("ok", || {
            ran.borrow_mut().push("ok");
            Ok(())
        });
        rollback.push("broken", || Err(std::io::Error::other("denied")));
        assert_eq!(rollback.unwind(), 1);
        assert_eq!(*ran.borrow(), vec!["ok"]);
    }

    #[test]
    fn test_remove_file_if_present() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpg");
        remove_file_if_present(&path).unwrap();

        std::fs::write(&path, b"x").unwrap();
        remove_file_if_present(&path).unwrap();
        assert!(!path.exists());
    }
}
