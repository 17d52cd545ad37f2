use console::style;
use doctest_engine::BatchReport;
use doctest_scanner::Status;

/// Print a batch report the way the tool always has: each directive's
/// expression, then its result, regressions in red, one summary line at the
/// end.
pub fn print(report: &BatchReport) {
    for outcome in &report.outcomes {
        println!(
            "{} {} {}",
            style(format!(
                "{}:{}:",
                outcome.file.display(),
                outcome.line + 1
            ))
            .dim(),
            style(">>>").bold(),
            outcome.expression
        );
        match outcome.status {
            Status::Regressed => {
                if let Some(previous) = &outcome.previous {
                    println!("{}", style(format!("WAS {previous}")).red());
                }
                println!("{}", style(format!("NOW {}", outcome.current)).red());
            }
            Status::Fresh | Status::Unchanged => {
                println!("{}", outcome.current);
            }
        }
        println!();
    }

    for failure in &report.failures {
        if failure.expression.is_empty() {
            println!(
                "{} {}",
                style(format!("{}:", failure.file.display())).dim(),
                style(&failure.message).red()
            );
        } else {
            println!(
                "{} {} {}",
                style(format!("{}:{}:", failure.file.display(), failure.line + 1)).dim(),
                style(">>>").bold(),
                failure.expression
            );
            println!("{}", style(&failure.message).red());
        }
        println!();
    }

    if report.succeeded() {
        println!(
            "{}",
            style("DOCTESTS SUCCEEDED WITH NO FAILURES").green().bold()
        );
    } else {
        println!("{}", style("DOCTESTS FAILED").red().bold());
    }
}
