//! Per-conversation stance history.
//!
//! Checkpoints live in an arena keyed by id. Branches hold ordered id lists
//! into that arena, so the DAG never owns itself. Parent links that point at
//! collected checkpoints are cleared (re-rooted) rather than left dangling.

use crate::checkpoint::{Branch, Checkpoint, CheckpointId, RollbackConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stanceflow_core::{ConversationId, Error, Result, Stance};
use stanceflow_diff::{merge, MergeResult, MergeStrategy};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of merging one branch into another.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchMerge {
    pub checkpoint_id: CheckpointId,
    /// Common ancestor used as the merge base, if one was reachable.
    pub base_id: Option<CheckpointId>,
    pub result: MergeResult,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StanceHistory {
    conversation_id: ConversationId,
    checkpoints: HashMap<CheckpointId, Checkpoint>,
    branches: BTreeMap<String, Branch>,
    current_branch: String,
    #[serde(default)]
    current_checkpoint: Option<CheckpointId>,
    #[serde(default)]
    config: RollbackConfig,
}

impl StanceHistory {
    pub fn new(conversation_id: ConversationId, config: RollbackConfig) -> Self {
        let default_branch = config.default_branch.clone();
        let mut branches = BTreeMap::new();
        branches.insert(default_branch.clone(), Branch::new(default_branch.clone(), None));
        Self {
            conversation_id,
            checkpoints: HashMap::new(),
            branches,
            current_branch: default_branch,
            current_checkpoint: None,
            config,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    pub fn current_checkpoint(&self) -> Option<&CheckpointId> {
        self.current_checkpoint.as_ref()
    }

    pub fn current_stance(&self) -> Option<&Stance> {
        self.current_checkpoint
            .as_ref()
            .and_then(|id| self.checkpoints.get(id))
            .map(|c| &c.stance)
    }

    /// Number of checkpoints held in the arena.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn get(&self, id: &CheckpointId) -> Result<&Checkpoint> {
        self.checkpoints
            .get(id)
            .ok_or_else(|| Error::checkpoint_not_found(id.as_str()))
    }

    pub fn branch(&self, name: &str) -> Result<&Branch> {
        self.branches
            .get(name)
            .ok_or_else(|| Error::branch_not_found(name))
    }

    /// Every branch, sorted by name.
    pub fn branches(&self) -> Vec<&Branch> {
        self.branches.values().collect()
    }

    pub fn head_stance(&self, branch: &str) -> Result<&Stance> {
        let head = self.branch_head(branch)?;
        Ok(&self.get(&head)?.stance)
    }

    /// Lineage of the branch head following first parents, oldest first.
    pub fn branch_history(&self, branch: &str) -> Result<Vec<&Checkpoint>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.branch(branch)?.head.clone();
        while let Some(id) = cursor {
            if !seen.insert(id.clone()) {
                break;
            }
            match self.checkpoints.get(&id) {
                Some(checkpoint) => {
                    cursor = checkpoint.parent_id.clone();
                    out.push(checkpoint);
                }
                None => break,
            }
        }
        out.reverse();
        Ok(out)
    }

    fn branch_head(&self, branch: &str) -> Result<CheckpointId> {
        self.branch(branch)?.head.clone().ok_or_else(|| {
            Error::invalid_operation(format!("branch '{}' has no checkpoints", branch))
        })
    }

    // ============================================================
    // Commit / rollback / checkout
    // ============================================================

    /// Snapshot `stance` on the current branch, child of the current checkpoint.
    pub fn commit(&mut self, stance: Stance, message: impl Into<String>) -> Result<CheckpointId> {
        let branch = self.current_branch.clone();
        let parent = self.current_checkpoint.clone();
        let id = self.commit_to(&branch, parent, None, stance, message.into())?;
        self.current_checkpoint = Some(id.clone());
        Ok(id)
    }

    fn commit_to(
        &mut self,
        branch: &str,
        parent_id: Option<CheckpointId>,
        merge_parent_id: Option<CheckpointId>,
        stance: Stance,
        message: String,
    ) -> Result<CheckpointId> {
        stance.validate()?;
        let cap = self.config.max_checkpoints_per_branch;
        let id = CheckpointId::generate();

        let entry = self
            .branches
            .get_mut(branch)
            .ok_or_else(|| Error::branch_not_found(branch))?;
        entry.checkpoints.push(id.clone());
        entry.head = Some(id.clone());
        let over_cap = entry.checkpoints.len() > cap;

        info!(
            "Committed checkpoint {} on '{}' (stance v{})",
            id, branch, stance.version
        );
        self.checkpoints.insert(
            id.clone(),
            Checkpoint {
                id: id.clone(),
                parent_id,
                merge_parent_id,
                branch: branch.to_string(),
                stance,
                message,
                created_at: Utc::now(),
            },
        );

        if over_cap {
            self.collect_garbage();
        }
        Ok(id)
    }

    /// Walk `steps` parents back from the current checkpoint and move the
    /// current branch head there. Zero steps returns the current stance.
    pub fn rollback(&mut self, steps: usize) -> Result<&Stance> {
        let mut target = self.current_checkpoint.clone().ok_or_else(|| {
            Error::invalid_operation(format!(
                "nothing to roll back on branch '{}'",
                self.current_branch
            ))
        })?;

        for taken in 0..steps {
            let parent = self
                .checkpoints
                .get(&target)
                .and_then(|c| c.parent_id.clone())
                .filter(|p| self.checkpoints.contains_key(p));
            match parent {
                Some(p) => target = p,
                None => {
                    return Err(Error::invalid_operation(format!(
                        "cannot roll back {} steps, only {} available",
                        steps, taken
                    )))
                }
            }
        }

        if let Some(branch) = self.branches.get_mut(&self.current_branch) {
            branch.head = Some(target.clone());
        }
        info!(
            "Rolled back {} step(s) on '{}' to {}",
            steps, self.current_branch, target
        );
        self.current_checkpoint = Some(target.clone());
        Ok(&self.get(&target)?.stance)
    }

    /// Make `id` the current checkpoint without moving any branch head.
    /// The next commit lands on the checkpoint's branch.
    pub fn checkout(&mut self, id: &CheckpointId) -> Result<&Stance> {
        let branch = self.get(id)?.branch.clone();
        if self.branches.contains_key(&branch) {
            self.current_branch = branch;
        } else {
            warn!(
                "Checkpoint {} belongs to deleted branch '{}', staying on '{}'",
                id, branch, self.current_branch
            );
        }
        self.current_checkpoint = Some(id.clone());
        debug!("Checked out {} on '{}'", id, self.current_branch);
        Ok(&self.get(id)?.stance)
    }

    // ============================================================
    // Branches
    // ============================================================

    /// Fork a branch at `from`, or at the current checkpoint when `None`.
    pub fn create_branch(&mut self, name: &str, from: Option<&CheckpointId>) -> Result<&Branch> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("branch name must not be empty"));
        }
        if self.branches.contains_key(name) {
            return Err(Error::BranchExists(name.to_string()));
        }
        let fork = match from {
            Some(id) => Some(self.get(id)?.id.clone()),
            None => self.current_checkpoint.clone(),
        };
        info!(
            "Created branch '{}' from {}",
            name,
            fork.as_ref().map_or("<empty>", |id| id.as_str())
        );
        let branch = self
            .branches
            .entry(name.to_string())
            .or_insert_with(|| Branch::new(name, fork));
        Ok(branch)
    }

    pub fn switch_branch(&mut self, name: &str) -> Result<()> {
        let head = self.branch(name)?.head.clone();
        self.current_branch = name.to_string();
        self.current_checkpoint = head;
        debug!("Switched to branch '{}'", name);
        Ok(())
    }

    /// Remove a branch and those of its checkpoints no remaining head, fork
    /// point, or the current checkpoint can reach. Returns how many
    /// checkpoints were dropped.
    pub fn delete_branch(&mut self, name: &str) -> Result<usize> {
        if name == self.config.default_branch {
            return Err(Error::invalid_operation(format!(
                "cannot delete default branch '{}'",
                name
            )));
        }
        if name == self.current_branch {
            return Err(Error::invalid_operation(format!(
                "cannot delete current branch '{}'",
                name
            )));
        }
        let branch = self
            .branches
            .remove(name)
            .ok_or_else(|| Error::branch_not_found(name))?;

        let live = self.live_set();
        let mut removed = 0;
        for id in &branch.checkpoints {
            if !live.contains(id) && self.checkpoints.remove(id).is_some() {
                removed += 1;
            }
        }
        self.reroot_orphans();
        info!("Deleted branch '{}' ({} checkpoints dropped)", name, removed);
        Ok(removed)
    }

    /// Three-way merge of `source` into `target` using their lowest common
    /// ancestor as base. The result is committed on `target` with the
    /// source head as second parent. The target side is "ours".
    pub fn merge_branches(
        &mut self,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> Result<BranchMerge> {
        if source == target {
            return Err(Error::invalid_operation(format!(
                "cannot merge branch '{}' into itself",
                source
            )));
        }
        let source_head = self.branch_head(source)?;
        let target_head = self.branch_head(target)?;
        let base_id = self.common_ancestor(&source_head, &target_head);

        let result = {
            let left = &self.get(&target_head)?.stance;
            let right = &self.get(&source_head)?.stance;
            let base = match &base_id {
                Some(id) => &self.get(id)?.stance,
                None => {
                    warn!(
                        "No common ancestor between '{}' and '{}', using target head as base",
                        source, target
                    );
                    left
                }
            };
            merge(base, left, right, strategy)?
        };

        let message = format!("Merge branch '{}' into '{}'", source, target);
        let checkpoint_id = self.commit_to(
            target,
            Some(target_head),
            Some(source_head),
            result.stance.clone(),
            message,
        )?;
        if self.current_branch == target {
            self.current_checkpoint = Some(checkpoint_id.clone());
        }
        info!(
            "Merged '{}' into '{}' with {} ({} conflicts)",
            source,
            target,
            strategy.as_str(),
            result.conflicts.len()
        );

        Ok(BranchMerge {
            checkpoint_id,
            base_id,
            result,
        })
    }

    /// `id` and everything reachable through parent and merge-parent links.
    fn ancestors(&self, id: &CheckpointId) -> HashSet<CheckpointId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(next) = queue.pop_front() {
            let Some(checkpoint) = self.checkpoints.get(&next) else {
                continue;
            };
            if !seen.insert(next) {
                continue;
            }
            queue.extend(checkpoint.parent_id.iter().cloned());
            queue.extend(checkpoint.merge_parent_id.iter().cloned());
        }
        seen
    }

    /// Nearest ancestor of `b` (by hops) that is also an ancestor of `a`.
    fn common_ancestor(&self, a: &CheckpointId, b: &CheckpointId) -> Option<CheckpointId> {
        let of_a = self.ancestors(a);
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([b.clone()]);
        while let Some(next) = queue.pop_front() {
            if of_a.contains(&next) {
                return Some(next);
            }
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(checkpoint) = self.checkpoints.get(&next) {
                queue.extend(checkpoint.parent_id.iter().cloned());
                queue.extend(checkpoint.merge_parent_id.iter().cloned());
            }
        }
        None
    }

    // ============================================================
    // Garbage collection
    // ============================================================

    /// Heads, the current checkpoint, anything another branch points at, and
    /// merge parents of checkpoints on other branches.
    fn is_protected(&self, id: &CheckpointId, owner: &str) -> bool {
        self.current_checkpoint.as_ref() == Some(id)
            || self
                .branches
                .values()
                .any(|b| b.head.as_ref() == Some(id) || (b.name != owner && b.references(id)))
            || self
                .checkpoints
                .values()
                .any(|c| c.branch != owner && c.merge_parent_id.as_ref() == Some(id))
    }

    /// Everything reachable from a branch head, a fork point, or the current
    /// checkpoint.
    fn live_set(&self) -> HashSet<CheckpointId> {
        let roots = self
            .branches
            .values()
            .flat_map(|b| b.head.iter().chain(b.forked_from.iter()))
            .chain(self.current_checkpoint.iter());
        let mut live = HashSet::new();
        for root in roots {
            if !live.contains(root) {
                live.extend(self.ancestors(root));
            }
        }
        live
    }

    /// Drop checkpoints no head can reach any more (left behind by a
    /// rollback), then the oldest checkpoints on each branch beyond the
    /// per-branch cap. Protected checkpoints stay even if that leaves a
    /// branch over the cap.
    pub fn collect_garbage(&mut self) -> usize {
        let cap = self.config.max_checkpoints_per_branch;
        let live = self.live_set();
        let unreachable: HashSet<CheckpointId> = self
            .checkpoints
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        let mut removed = unreachable.len();
        if !unreachable.is_empty() {
            debug!("Dropping {} unreachable checkpoint(s)", removed);
            self.checkpoints.retain(|id, _| !unreachable.contains(id));
            for branch in self.branches.values_mut() {
                branch.checkpoints.retain(|id| !unreachable.contains(id));
            }
        }

        let names: Vec<String> = self.branches.keys().cloned().collect();

        for name in names {
            let candidates: Vec<CheckpointId> = match self.branches.get(&name) {
                Some(b) if b.checkpoints.len() > cap => {
                    b.checkpoints[..b.checkpoints.len() - cap].to_vec()
                }
                _ => continue,
            };
            let dropped: HashSet<CheckpointId> = candidates
                .into_iter()
                .filter(|id| !self.is_protected(id, &name))
                .collect();
            if dropped.is_empty() {
                continue;
            }
            for id in &dropped {
                self.checkpoints.remove(id);
            }
            if let Some(branch) = self.branches.get_mut(&name) {
                branch.checkpoints.retain(|id| !dropped.contains(id));
            }
            removed += dropped.len();
        }

        if removed > 0 {
            self.reroot_orphans();
            info!(
                "Collected {} checkpoint(s) for conversation {}",
                removed, self.conversation_id
            );
        }
        removed
    }

    fn reroot_orphans(&mut self) {
        let live: HashSet<CheckpointId> = self.checkpoints.keys().cloned().collect();
        for checkpoint in self.checkpoints.values_mut() {
            if checkpoint.parent_id.as_ref().is_some_and(|p| !live.contains(p)) {
                debug!("Re-rooting orphaned checkpoint {}", checkpoint.id);
                checkpoint.parent_id = None;
            }
            if checkpoint
                .merge_parent_id
                .as_ref()
                .is_some_and(|p| !live.contains(p))
            {
                checkpoint.merge_parent_id = None;
            }
        }
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Write the history as pretty JSON via temp file + rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        debug!("Saved history for {} to {}", self.conversation_id, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let history: Self = serde_json::from_str(&content)?;
        history.check_integrity()?;
        Ok(history)
    }

    /// Load `path` if it exists, otherwise start an empty history.
    pub fn load_or_new(
        path: &Path,
        conversation_id: ConversationId,
        config: RollbackConfig,
    ) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No history at {}, starting fresh", path.display());
            Ok(Self::new(conversation_id, config))
        }
    }

    fn check_integrity(&self) -> Result<()> {
        if !self.branches.contains_key(&self.config.default_branch) {
            return Err(Error::validation(format!(
                "default branch '{}' is missing",
                self.config.default_branch
            )));
        }
        if !self.branches.contains_key(&self.current_branch) {
            return Err(Error::validation(format!(
                "current branch '{}' is missing",
                self.current_branch
            )));
        }
        for branch in self.branches.values() {
            if let Some(head) = &branch.head {
                if !self.checkpoints.contains_key(head) {
                    return Err(Error::validation(format!(
                        "branch '{}' head {} is not in the history",
                        branch.name, head
                    )));
                }
            }
        }
        if let Some(current) = &self.current_checkpoint {
            if !self.checkpoints.contains_key(current) {
                return Err(Error::checkpoint_not_found(current.as_str()));
            }
        }
        Ok(())
    }
}
