//! Filename templates for the metrics files of a run.
//!
//! Templates are regular expressions with `{lane}` and `{barcode_id}`
//! placeholders. Values are escaped before substitution, and a set of
//! templates renders to a single alternation. Most files come in two
//! naming orders depending on whether the `_nophix` marker precedes or
//! follows the barcode, so most sets carry two templates.

use regex::Regex;

/// Path separator or start of string, anchoring the lane to a file name
const SEP: &str = r"(?:^|[/\\])";

/// A named group of filename templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSet {
    name: &'static str,
    templates: &'static [&'static str],
}

impl PatternSet {
    #[must_use]
    pub const fn new(name: &'static str, templates: &'static [&'static str]) -> Self {
        Self { name, templates }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn templates(&self) -> &'static [&'static str] {
        self.templates
    }

    /// Substitute `lane` and `barcode_id` into every template and join the
    /// results into one expression.
    ///
    /// # Errors
    ///
    /// Returns an error if a template is not a valid regular expression.
    pub fn render(&self, lane: &str, barcode_id: &str) -> Result<Regex, regex::Error> {
        let lane = regex::escape(lane);
        let barcode_id = regex::escape(barcode_id);
        let alternatives: Vec<String> = self
            .templates
            .iter()
            .map(|template| {
                let body = template
                    .replace("{sep}", SEP)
                    .replace("{lane}", &lane)
                    .replace("{barcode_id}", &barcode_id);
                format!("(?:{body})")
            })
            .collect();
        Regex::new(&alternatives.join("|"))
    }
}

/// Picard alignment, duplication, insert size and hybrid selection metrics
pub const PICARD_METRICS: PatternSet = PatternSet::new(
    "picard_metrics",
    &[
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?_{barcode_id}-.*\.(align|hs|insert|dup)_metrics$",
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+_{barcode_id}(_nophix)?-.*\.(align|hs|insert|dup)_metrics$",
    ],
);

/// FastQ Screen summaries for either read of a pair
pub const FASTQ_SCREEN: PatternSet = PatternSet::new(
    "fastq_screen",
    &[
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?_{barcode_id}_[12]_fastq_screen\.txt$",
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+_{barcode_id}(_nophix)?_[12]_fastq_screen\.txt$",
    ],
);

/// Files inside a sample's FastQC report directory
pub const FASTQC: PatternSet = PatternSet::new(
    "fastqc",
    &[
        r"{sep}fastqc[/\\]{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?_{barcode_id}[-_.]",
        r"{sep}fastqc[/\\]{lane}_[0-9]+_[0-9A-Za-z]+_{barcode_id}(_nophix)?[-_.]",
    ],
);

/// Per-sample read filter metrics
pub const SAMPLE_FILTER_METRICS: PatternSet = PatternSet::new(
    "sample_filter_metrics",
    &[
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+_{barcode_id}(_nophix)?\.filter_metrics$",
        r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?_{barcode_id}\.filter_metrics$",
    ],
);

/// Per-lane barcode counts
pub const BC_METRICS: PatternSet = PatternSet::new(
    "bc_metrics",
    &[r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?[._]bc[._]metrics$"],
);

/// Per-lane read filter metrics
pub const FLOWCELL_FILTER_METRICS: PatternSet = PatternSet::new(
    "flowcell_filter_metrics",
    &[r"{sep}{lane}_[0-9]+_[0-9A-Za-z]+(_nophix)?\.filter_metrics$"],
);
