//! Progress reporting for query runs

use colored::Colorize;
use finsight_application::ports::RunProgress;
use finsight_domain::{RunStage, StrategyKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a query run with a spinner
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn stage_display_name(stage: RunStage) -> &'static str {
        match stage {
            RunStage::Planning => "Planning",
            RunStage::Retrieving => "Retrieving evidence",
            RunStage::Validating => "Validating evidence",
            RunStage::Synthesizing => "Synthesizing answer",
            RunStage::Critiquing => "Critiquing draft",
            RunStage::Complete => "Done",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgress for ProgressReporter {
    fn on_stage(&self, stage: RunStage) {
        let mut guard = self.spinner.lock().unwrap();

        if stage == RunStage::Complete {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
            return;
        }

        let pb = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        pb.set_prefix(Self::stage_display_name(stage));
        pb.set_message("");
    }

    fn on_strategy_attempt(&self, strategy: StrategyKind, attempt: usize) {
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            pb.set_message(format!("{strategy} (attempt {attempt})"));
        }
    }

    fn on_subtask_complete(&self, _id: usize, topic: &str, success: bool) {
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            let mark = if success { "v" } else { "x" };
            pb.set_message(format!("{mark} {topic}"));
        }
    }

    fn on_iteration(&self, iteration: usize, accumulated_chunks: usize) {
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            pb.set_message(format!(
                "iteration {iteration}, {accumulated_chunks} passages"
            ));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl RunProgress for SimpleProgress {
    fn on_stage(&self, stage: RunStage) {
        if stage != RunStage::Complete {
            println!(
                "{} {}",
                "->".cyan(),
                ProgressReporter::stage_display_name(stage).bold()
            );
        }
    }

    fn on_strategy_attempt(&self, strategy: StrategyKind, attempt: usize) {
        println!("  {strategy} (attempt {attempt})");
    }

    fn on_subtask_complete(&self, _id: usize, topic: &str, success: bool) {
        if success {
            println!("  {} {}", "v".green(), topic);
        } else {
            println!("  {} {} (failed)", "x".red(), topic);
        }
    }

    fn on_iteration(&self, iteration: usize, accumulated_chunks: usize) {
        println!("  iteration {iteration}, {accumulated_chunks} passages");
    }
}
