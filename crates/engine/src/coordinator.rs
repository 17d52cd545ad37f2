use crate::emit::full_rewrite;
use crate::error::{EngineError, Result};
use crate::reconcile::reconcile;
use doctest_eval::Evaluator;
use doctest_scanner::{Annotation, DirectiveGroup, DirectiveScanner, SourceFile, Status};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Smallest set of files that must share one evaluator session.
///
/// Directive expressions may reference symbols defined elsewhere in the same
/// file or in sibling files, so every file of a root is loaded into the
/// session before any directive in the root is evaluated. The grouping
/// policy here is the parent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRoot {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Partition files into evaluation roots by parent directory.
///
/// Output order is deterministic (sorted by directory, files sorted and
/// deduplicated within a root).
pub fn partition_roots(files: &[PathBuf]) -> Vec<EvaluationRoot> {
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        by_dir.entry(dir).or_default().push(file.clone());
    }
    by_dir
        .into_iter()
        .map(|(dir, mut files)| {
            files.sort();
            files.dedup();
            EvaluationRoot { dir, files }
        })
        .collect()
}

/// Outcome of one directive in a batch run
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveOutcome {
    pub file: PathBuf,
    /// 0-based marker line
    pub line: usize,
    pub expression: String,
    pub status: Status,
    /// Baseline value for regressions (`WAS`)
    pub previous: Option<String>,
    /// Result of this run
    pub current: String,
}

/// An evaluation error surfaced with the offending expression
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationFailure {
    pub file: PathBuf,
    pub line: usize,
    pub expression: String,
    pub message: String,
}

/// Aggregated result of a batch run
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<DirectiveOutcome>,
    pub failures: Vec<EvaluationFailure>,
    pub files_rewritten: usize,
}

impl BatchReport {
    pub fn has_regressions(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == Status::Regressed)
    }

    /// A run succeeds when nothing regressed and nothing failed to evaluate
    pub fn succeeded(&self) -> bool {
        !self.has_regressions() && self.failures.is_empty()
    }

    fn merge(&mut self, other: BatchReport) {
        self.outcomes.extend(other.outcomes);
        self.failures.extend(other.failures);
        self.files_rewritten += other.files_rewritten;
    }
}

/// Drives the evaluator over evaluation roots and collects fresh results.
///
/// Roots are mutually independent and run in parallel; within a root the
/// session is used strictly sequentially, and within a file directives are
/// evaluated in source order so earlier side effects are observable to later
/// expressions. Evaluation carries no built-in timeout; callers wanting one
/// must wrap the returned future in their own cancellation boundary, which
/// is safe because no file is written until its directives all evaluated.
pub struct EvaluationCoordinator {
    evaluator: Arc<dyn Evaluator>,
}

impl EvaluationCoordinator {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }

    /// Batch mode: evaluate every directive in the given files and rewrite
    /// the files whose annotations changed.
    ///
    /// An evaluation error aborts the remainder of its root (the offending
    /// file is left unwritten); other roots are unaffected.
    pub async fn run_batch(&self, files: Vec<PathBuf>) -> Result<BatchReport> {
        let roots = partition_roots(&files);
        log::info!(
            "evaluating {} files across {} roots",
            files.len(),
            roots.len()
        );

        let mut tasks = JoinSet::new();
        for root in roots {
            let evaluator = Arc::clone(&self.evaluator);
            tasks.spawn(async move { run_root(evaluator, root).await });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            let root_report = joined.map_err(|e| EngineError::Task(e.to_string()))??;
            report.merge(root_report);
        }

        report
            .outcomes
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        report
            .failures
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        Ok(report)
    }

    /// Interactive mode: evaluate one expression inside a dedicated,
    /// throwaway session scoped to the given file. One broken expression
    /// elsewhere never blocks this evaluation, and no batch session state
    /// leaks in.
    pub async fn evaluate_single(&self, file: &Path, expression: &str) -> Result<String> {
        let root = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut session = self
            .evaluator
            .open_session(root)
            .await
            .map_err(|e| EngineError::eval(expression, e))?;
        session
            .load_file(file)
            .await
            .map_err(|e| EngineError::eval(expression, e))?;
        session
            .evaluate(expression)
            .await
            .map_err(|e| EngineError::eval(expression, e))
    }
}

async fn run_root(evaluator: Arc<dyn Evaluator>, root: EvaluationRoot) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    let mut session = match evaluator.open_session(&root.dir).await {
        Ok(session) => session,
        Err(e) => {
            report.failures.push(EvaluationFailure {
                file: root.dir.clone(),
                line: 0,
                expression: String::new(),
                message: format!("failed to open session: {e}"),
            });
            return Ok(report);
        }
    };

    // Scan everything up front; the comment models double as the write
    // targets later.
    let mut scanned: Vec<(SourceFile, Vec<DirectiveGroup>)> = Vec::new();
    for path in &root.files {
        let file = SourceFile::parse(path)?;
        let groups = DirectiveScanner::new().scan(&file);
        scanned.push((file, groups));
    }

    // Every file of the root is loaded before any directive is evaluated, so
    // expressions can reference symbols from sibling files.
    for path in &root.files {
        if let Err(e) = session.load_file(path).await {
            report.failures.push(EvaluationFailure {
                file: path.clone(),
                line: 0,
                expression: String::new(),
                message: format!("failed to load file: {e}"),
            });
            return Ok(report);
        }
    }

    'root: for (file, groups) in &scanned {
        let mut changes: Vec<(&DirectiveGroup, Annotation)> = Vec::new();
        for group in groups {
            let fresh = match session.evaluate(&group.expression).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    // Abort the remainder of the root; this file is left
                    // unwritten so it never ends up partially rewritten.
                    report.failures.push(EvaluationFailure {
                        file: file.path().to_path_buf(),
                        line: group.marker.line,
                        expression: group.expression.clone(),
                        message: e.to_string(),
                    });
                    break 'root;
                }
            };

            let (annotation, status) = reconcile(&group.annotation, &fresh);
            report.outcomes.push(DirectiveOutcome {
                file: file.path().to_path_buf(),
                line: group.marker.line,
                expression: group.expression.clone(),
                status,
                previous: previous_of(&group.annotation, status),
                current: fresh,
            });
            changes.push((group, annotation));
        }

        if full_rewrite(file, &changes)? {
            report.files_rewritten += 1;
        }
    }

    Ok(report)
}

/// Baseline value to show for a regressed directive
fn previous_of(existing: &Annotation, status: Status) -> Option<String> {
    if status != Status::Regressed {
        return None;
    }
    match existing {
        Annotation::Single(value) => Some(value.clone()),
        Annotation::WasNow { was, .. } => Some(was.clone()),
        Annotation::None => None,
    }
}
