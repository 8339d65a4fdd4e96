//! Binding a stage DAG to a job graph.

use std::collections::HashMap;

use drover_common::{DroverError, DroverResult, JobId, StageId};
use drover_exec::StagePlan;
use tracing::debug;

use super::Job;

/// Jobs for every stage of a plan, with dependencies mirroring stage edges.
///
/// Jobs are numbered from 1 in topological order, so every job follows its
/// dependencies in [`JobGraph::jobs`].
#[derive(Debug, Clone)]
pub struct JobGraph {
    group: String,
    jobs: Vec<Job>,
    by_stage: HashMap<StageId, JobId>,
}

impl JobGraph {
    /// Binds every stage of `stages` to a job named `<group>-<stage>`.
    pub fn bind(stages: &StagePlan, group: &str) -> DroverResult<Self> {
        if group.trim().is_empty() {
            return Err(DroverError::job_creation("group name is empty"));
        }
        if stages.is_empty() {
            return Err(DroverError::job_creation("stage plan has no stages"));
        }

        let order = stages.topological_order()?;
        let mut jobs = Vec::with_capacity(order.len());
        let mut by_stage = HashMap::with_capacity(order.len());

        for (position, stage_id) in order.into_iter().enumerate() {
            let stage = stages
                .get(stage_id)
                .ok_or_else(|| DroverError::job_creation(format!("no such stage {stage_id}")))?;

            let dependencies = stages
                .predecessors(stage_id)
                .iter()
                .map(|pred| {
                    by_stage.get(pred).copied().ok_or_else(|| {
                        DroverError::job_creation(format!(
                            "{stage_id} depends on unbound {pred}"
                        ))
                    })
                })
                .collect::<DroverResult<Vec<_>>>()?;

            let id = JobId::new(position as u64 + 1);
            let job = Job {
                id,
                name: format!("{group}-{stage_id}"),
                stage: stage_id,
                kind: stage.kind,
                parallelism: stage.parallelism,
                operators: stage.operators.clone(),
                dependencies,
            };
            debug!(job = %id, name = %job.name, deps = job.dependencies.len(), "Bound stage to job");
            by_stage.insert(stage_id, id);
            jobs.push(job);
        }

        Ok(Self {
            group: group.to_string(),
            jobs,
            by_stage,
        })
    }

    /// Returns the group name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if there are no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the jobs in dependency order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Looks up a job.
    pub fn get(&self, id: JobId) -> Option<&Job> {
        let index = usize::try_from(id.as_u64()).ok()?.checked_sub(1)?;
        self.jobs.get(index)
    }

    /// Looks up a job, failing with [`DroverError::UnknownJob`].
    pub fn require(&self, id: JobId) -> DroverResult<&Job> {
        self.get(id).ok_or(DroverError::UnknownJob { job_id: id })
    }

    /// Returns the job executing `stage`.
    pub fn job_for_stage(&self, stage: StageId) -> Option<JobId> {
        self.by_stage.get(&stage).copied()
    }

    /// Returns the jobs that depend directly on `id`.
    pub fn dependents(&self, id: JobId) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.dependencies.contains(&id))
            .map(|job| job.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use drover_common::config::CompilerConfig;
    use drover_common::ErrorCode;
    use drover_exec::physical::{PhysicalKind, PhysicalPlanBuilder};
    use drover_exec::{StageCompiler, StageKind};

    use super::*;

    fn stages() -> StagePlan {
        let mut b = PhysicalPlanBuilder::new("g");
        let left = b.load("a").unwrap();
        let right = b.load("b").unwrap();
        let join = b
            .add(
                PhysicalKind::Join {
                    keys: vec![vec![0], vec![0]],
                    parallelism: Some(2),
                },
                &[left, right],
            )
            .unwrap();
        b.store("out", &join).unwrap();
        StageCompiler::new(CompilerConfig::default())
            .compile(b.build())
            .unwrap()
    }

    #[test]
    fn test_bind_mirrors_stage_edges() {
        let graph = JobGraph::bind(&stages(), "nightly").unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.group(), "nightly");

        let join = &graph.jobs()[2];
        assert_eq!(join.kind, StageKind::Shuffle);
        assert_eq!(join.name, "nightly-stage-2");
        assert_eq!(join.parallelism, 2);
        assert_eq!(join.dependencies, vec![JobId::new(1), JobId::new(2)]);
        assert_eq!(graph.dependents(JobId::new(1)), vec![join.id]);
        assert_eq!(graph.job_for_stage(StageId::new(2)), Some(join.id));
        assert_eq!(graph.get(join.id), Some(join));
        assert!(graph.get(JobId::new(0)).is_none());
    }

    #[test]
    fn test_bind_rejects_empty_group() {
        let err = JobGraph::bind(&stages(), " ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::JobCreation);
    }
}
