//! Declarative foreign-key checks
//!
//! A [`ForeignKeyCheck`] is a list of relation groups. Each group is guarded
//! by a table: when the guard table is empty there is nothing to test and
//! the group is skipped with an INFO entry. A relation may carry its own
//! guard on top of that (e.g. `conservation_score` is only checked when it
//! has rows).

use async_trait::async_trait;
use genocheck_core::{CheckMetadata, DatabaseKind, FindingCode, Team};
use genocheck_engine::{Check, CheckContext, CheckError};

/// Whether NULL child keys are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// NULL keys are reported as a warning; unmatched keys fail
    Mandatory,

    /// NULL keys are valid and never counted
    Optional,
}

/// One `child.child_key -> parent.parent_key` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub child: &'static str,
    pub child_key: &'static str,
    pub parent: &'static str,
    pub parent_key: &'static str,
    pub requirement: Requirement,

    /// Only checked when this table has rows
    pub only_if_populated: Option<&'static str>,
}

impl Relation {
    pub fn mandatory(child: &'static str, child_key: &'static str, parent: &'static str, parent_key: &'static str) -> Self {
        Self {
            child,
            child_key,
            parent,
            parent_key,
            requirement: Requirement::Mandatory,
            only_if_populated: None,
        }
    }

    pub fn optional(child: &'static str, child_key: &'static str, parent: &'static str, parent_key: &'static str) -> Self {
        Self {
            requirement: Requirement::Optional,
            ..Self::mandatory(child, child_key, parent, parent_key)
        }
    }

    pub fn only_if_populated(mut self, table: &'static str) -> Self {
        self.only_if_populated = Some(table);
        self
    }
}

/// Relations that are only meaningful when `guard` has rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationGroup {
    pub guard: &'static str,
    pub relations: Vec<Relation>,
}

impl RelationGroup {
    pub fn new(guard: &'static str, relations: Vec<Relation>) -> Self {
        Self { guard, relations }
    }
}

/// Check made of guarded relation groups
pub struct ForeignKeyCheck {
    metadata: CheckMetadata,
    groups: Vec<RelationGroup>,
}

impl ForeignKeyCheck {
    pub fn new(metadata: CheckMetadata, groups: Vec<RelationGroup>) -> Self {
        Self { metadata, groups }
    }

    pub fn groups(&self) -> &[RelationGroup] {
        &self.groups
    }

    async fn check_relation(&self, ctx: &CheckContext, relation: &Relation) -> Result<bool, CheckError> {
        if let Some(table) = relation.only_if_populated {
            if !ctx.table_has_rows(table).await? {
                tracing::debug!(check = ctx.check_name(), table, "relation skipped, table is empty");
                return Ok(true);
            }
        }

        match relation.requirement {
            Requirement::Mandatory => {
                ctx.check_for_orphans(relation.child, relation.child_key, relation.parent, relation.parent_key)
                    .await
            }
            Requirement::Optional => {
                ctx.check_optional_relation(relation.child, relation.child_key, relation.parent, relation.parent_key)
                    .await
            }
        }
    }
}

#[async_trait]
impl Check for ForeignKeyCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    async fn run(&self, ctx: &mut CheckContext) -> Result<bool, CheckError> {
        let mut result = true;

        for group in &self.groups {
            let populated = ctx.table_has_rows(group.guard).await;
            let populated = match populated {
                Ok(populated) => populated,
                Err(err) => {
                    result &= ctx.settle(Err(err)).await;
                    continue;
                }
            };

            if !populated {
                ctx.info(
                    FindingCode::EmptyTable,
                    format!("{} is empty, nothing to test", group.guard),
                )
                .await;
                continue;
            }

            for relation in &group.relations {
                let held = self.check_relation(ctx, relation).await;
                result &= ctx.settle(held).await;
            }
        }

        Ok(result)
    }
}

/// References to `genomic_align_block.genomic_align_block_id`
pub fn genomic_align_block_id() -> ForeignKeyCheck {
    ForeignKeyCheck::new(
        CheckMetadata::builder("ForeignKeyGenomicAlignBlockId")
            .description("Check for broken foreign-key relationships in ensembl_compara databases.")
            .group("compara_genomic")
            .team(Team::Compara)
            .only_kinds([DatabaseKind::Compara])
            .build(),
        vec![RelationGroup::new(
            "genomic_align_block",
            vec![
                Relation::mandatory("genomic_align_block", "genomic_align_block_id", "genomic_align", "genomic_align_block_id"),
                Relation::mandatory("genomic_align", "genomic_align_block_id", "genomic_align_block", "genomic_align_block_id"),
                Relation::mandatory("conservation_score", "genomic_align_block_id", "genomic_align_block", "genomic_align_block_id")
                    .only_if_populated("conservation_score"),
            ],
        )],
    )
}

/// References to `seq_member` and `gene_member`
pub fn member_id() -> ForeignKeyCheck {
    ForeignKeyCheck::new(
        CheckMetadata::builder("ForeignKeyMemberId")
            .description("Check for broken foreign-key relationships in ensembl_compara databases.")
            .group("compara_homology")
            .team(Team::Compara)
            .only_kinds([DatabaseKind::Compara])
            .build(),
        vec![
            RelationGroup::new(
                "seq_member",
                vec![
                    Relation::mandatory("family_member", "seq_member_id", "seq_member", "seq_member_id"),
                    Relation::mandatory("homology_member", "seq_member_id", "seq_member", "seq_member_id"),
                    Relation::mandatory("gene_align_member", "seq_member_id", "seq_member", "seq_member_id"),
                    Relation::mandatory("other_member_sequence", "seq_member_id", "seq_member", "seq_member_id"),
                    Relation::optional("gene_tree_node", "seq_member_id", "seq_member", "seq_member_id"),
                ],
            ),
            RelationGroup::new(
                "gene_member",
                vec![
                    Relation::mandatory("homology_member", "gene_member_id", "gene_member", "gene_member_id"),
                    Relation::mandatory("member_xref", "gene_member_id", "gene_member", "gene_member_id"),
                    Relation::optional("seq_member", "gene_member_id", "gene_member", "gene_member_id"),
                ],
            ),
        ],
    )
}
