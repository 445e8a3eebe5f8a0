//! Canonical transcripts of protein-coding genes

use async_trait::async_trait;
use genocheck_core::{CheckMetadata, DatabaseKind, FindingCode, Severity, Team};
use genocheck_engine::{Check, CheckContext, CheckError};

/// A count query that must come back zero, with its messages
struct ZeroCount {
    sql: &'static str,
    problem: &'static str,
    correct: &'static str,
}

const BIOTYPE_ASSERTIONS: [ZeroCount; 8] = [
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g WHERE g.gene_id IN (SELECT tr.gene_id FROM transcript tr WHERE tr.biotype='protein_coding') AND g.biotype!='protein_coding'",
        problem: "genes with at least one protein_coding transcript do not have biotype protein_coding",
        correct: "All genes with protein_coding transcripts have protein_coding biotype",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM transcript tr LEFT JOIN translation tl ON tl.transcript_id=tr.transcript_id WHERE tr.biotype='protein_coding' AND tl.transcript_id IS NULL",
        problem: "protein_coding transcripts do not have translations",
        correct: "All protein_coding transcripts have translations",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g WHERE g.canonical_transcript_id IS NULL",
        problem: "genes do not have a canonical transcript",
        correct: "All genes have a canonical transcript",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g WHERE g.canonical_transcript_id IN (SELECT tr.transcript_id FROM transcript tr, translation tl WHERE tr.transcript_id=tl.transcript_id) AND g.biotype NOT IN ('rRNA','retrotransposed','protein_coding','IG_C_gene','IG_D_gene','IG_J_gene','IG_V_gene')",
        problem: "genes with canonical transcripts have the wrong biotype",
        correct: "All genes with canonical transcripts have the correct biotype",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g WHERE g.canonical_transcript_id IN (SELECT tr.transcript_id FROM transcript tr, translation tl WHERE tr.transcript_id=tl.transcript_id AND tr.biotype NOT IN ('rRNA','retrotransposed','protein_coding','IG_C_gene','IG_D_gene','IG_J_gene','IG_V_gene'))",
        problem: "genes have canonical transcripts with mismatched biotypes",
        correct: "All genes have canonical transcripts with matching biotypes",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g JOIN transcript t USING (gene_id) WHERE g.gene_id IN (SELECT g.gene_id FROM gene g JOIN transcript t ON (g.canonical_transcript_id = t.transcript_id) WHERE g.biotype = 'protein_coding' AND t.biotype != 'protein_coding') AND t.biotype = 'protein_coding'",
        problem: "genes with at least one protein_coding transcript do not have a protein_coding canonical transcript",
        correct: "All genes with at least one protein_coding transcript have a protein_coding canonical transcript",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g JOIN transcript t USING (gene_id) JOIN translation p ON (t.canonical_translation_id = p.translation_id) WHERE g.biotype = 'protein_coding' AND g.gene_id NOT IN (SELECT gene_id FROM transcript WHERE biotype = 'protein_coding')",
        problem: "protein_coding genes with no protein_coding transcripts have no transcripts with translations",
        correct: "All protein_coding genes with no protein_coding transcripts have at least one transcript which translates",
    },
    ZeroCount {
        sql: "SELECT COUNT(*) FROM gene g LEFT JOIN translation tr ON g.canonical_transcript_id=tr.transcript_id WHERE g.biotype='protein_coding' AND tr.transcript_id IS NULL",
        problem: "protein_coding genes have canonical transcripts that do not have valid translations",
        correct: "All protein_coding genes have canonical transcripts that translate",
    },
];

const CANONICAL_TRANSLATIONS: &str = "SELECT COUNT(*) FROM transcript t1, translation p, transcript t2 WHERE t1.canonical_translation_id = p.translation_id AND p.transcript_id = t2.transcript_id";
const ALL_TRANSLATIONS: &str = "SELECT COUNT(*) FROM translation p, transcript t WHERE t.transcript_id = p.transcript_id";

pub struct CanonicalTranscriptCheck {
    metadata: CheckMetadata,
}

impl CanonicalTranscriptCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata::builder("CanonicalTranscriptCoding")
                .description("Check that protein_coding genes have a canonical transcript with a valid translation, and that the number of canonical translations is correct.")
                .group("release")
                .group("post_genebuild")
                .team(Team::Compara)
                .only_kinds(DatabaseKind::ALL.into_iter().filter(|kind| kind.is_generic()))
                .build(),
        }
    }

    async fn check_translation_counts(&self, ctx: &CheckContext) -> Result<bool, CheckError> {
        let canonical = ctx.get_row_count(CANONICAL_TRANSLATIONS).await?;
        let total = ctx.get_row_count(ALL_TRANSLATIONS).await?;

        if canonical != total {
            let entry = ctx
                .entry(
                    Severity::Problem,
                    FindingCode::RowCount,
                    format!(
                        "Number of canonical translations ({}) is different from the total number of translations ({})",
                        canonical, total
                    ),
                )
                .with_comparison(total.to_string(), canonical.to_string());
            ctx.record(entry).await;
            Ok(false)
        } else {
            ctx.correct(FindingCode::RowCount, "Number of canonical translations is correct")
                .await;
            Ok(true)
        }
    }
}

impl Default for CanonicalTranscriptCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for CanonicalTranscriptCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    async fn run(&self, ctx: &mut CheckContext) -> Result<bool, CheckError> {
        let mut result = true;

        for assertion in &BIOTYPE_ASSERTIONS {
            let held = ctx
                .assert_zero(FindingCode::RowCount, assertion.sql, assertion.problem, assertion.correct)
                .await;
            result &= ctx.settle(held).await;
        }

        let counts = self.check_translation_counts(ctx).await;
        result &= ctx.settle(counts).await;

        Ok(result)
    }
}
