//! Input validation for schedule data.
//!
//! The engine tolerates bad data at compute time (it drops and logs).
//! These checks are for the host's create/update endpoints, which should
//! reject bad records before they are stored. Detects:
//! - Duplicate project, milestone, or dependency IDs
//! - Milestones referencing unknown projects
//! - Projects or milestones that start after they end
//! - Self-loop dependencies (same entity and anchor)
//! - Dependencies referencing unknown entities
//! - Circular dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::graph::ScheduleGraph;
use crate::models::{Dependency, DependencyRecord, EntityRef, MilestoneRecord, ProjectRecord};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two records share the same ID.
    DuplicateId,
    /// A milestone references a project that doesn't exist.
    UnknownProject,
    /// An entity starts after it ends.
    InvertedInterval,
    /// A dependency links an anchor to itself.
    SelfLoop,
    /// A dependency references an entity that doesn't exist.
    InvalidEndpoint,
    /// Dependency graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the full input set.
///
/// Checks:
/// 1. No duplicate project, milestone, or dependency IDs
/// 2. Every milestone's project exists
/// 3. No effective interval with `start > end`
/// 4. No self-loop dependencies
/// 5. Every active dependency's endpoints exist
/// 6. No circular dependencies among active dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    projects: &[ProjectRecord],
    milestones: &[MilestoneRecord],
    dependencies: &[DependencyRecord],
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut known: HashSet<EntityRef> = HashSet::new();

    for project in projects {
        let reference = EntityRef::Project(project.id);
        if !known.insert(reference) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate project ID: {}", project.id),
            ));
        }
        if let (Some(start), Some(end)) = (project.effective_start(), project.effective_end()) {
            if start > end {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvertedInterval,
                    format!("Project {} starts {} after it ends {}", project.id, start, end),
                ));
            }
        }
    }

    for milestone in milestones {
        if !known.insert(EntityRef::Milestone(milestone.id)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate milestone ID: {}", milestone.id),
            ));
        }
        if !known.contains(&EntityRef::Project(milestone.project_id)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownProject,
                format!(
                    "Milestone {} references unknown project {}",
                    milestone.id, milestone.project_id
                ),
            ));
        }
        if let Some(range) = milestone.to_entity().range() {
            if !range.is_ordered() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvertedInterval,
                    format!(
                        "Milestone {} starts {} after it ends {}",
                        milestone.id, range.start, range.end
                    ),
                ));
            }
        }
    }

    let mut dependency_ids = HashSet::new();
    let mut active = Vec::new();
    for record in dependencies {
        if !dependency_ids.insert(record.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate dependency ID: {}", record.id),
            ));
        }
        let dep = record.to_dependency();
        let mut valid = true;
        if let Some(err) = check_dependency(&dep, |r| known.contains(&r)) {
            errors.push(err);
            valid = false;
        }
        if valid && dep.active {
            active.push(dep);
        }
    }

    if let Some(cycle_err) = detect_cycles(&active) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates one dependency before it is created.
///
/// Rejects self-loops, endpoints missing from `graph`, and dependencies
/// that would close a cycle with the graph's existing dependencies.
pub fn validate_new_dependency(
    graph: &ScheduleGraph,
    dependency: &Dependency,
) -> Result<(), ValidationError> {
    if let Some(err) = check_dependency(dependency, |r| graph.contains(r)) {
        return Err(err);
    }

    let mut candidate: Vec<Dependency> = graph.dependencies().to_vec();
    candidate.push(dependency.clone());
    match detect_cycles(&candidate) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_dependency(
    dep: &Dependency,
    exists: impl Fn(EntityRef) -> bool,
) -> Option<ValidationError> {
    if dep.is_self_loop() {
        return Some(ValidationError::new(
            ValidationErrorKind::SelfLoop,
            format!(
                "Dependency {} links {}.{} to itself",
                dep.id, dep.predecessor, dep.predecessor_point
            ),
        ));
    }
    for endpoint in [dep.predecessor, dep.successor] {
        if !exists(endpoint) {
            return Some(ValidationError::new(
                ValidationErrorKind::InvalidEndpoint,
                format!("Dependency {} references unknown {}", dep.id, endpoint),
            ));
        }
    }
    None
}

/// Detects cycles in the entity-level dependency graph using DFS.
///
/// Edges between two anchors of the same entity are not cycles.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
fn detect_cycles(dependencies: &[Dependency]) -> Option<ValidationError> {
    // Build adjacency list: predecessor → successors
    let mut adj: HashMap<EntityRef, Vec<EntityRef>> = HashMap::new();
    let mut all: Vec<EntityRef> = Vec::new();

    for dep in dependencies {
        if dep.predecessor == dep.successor {
            continue;
        }
        adj.entry(dep.predecessor).or_default().push(dep.successor);
        all.push(dep.predecessor);
        all.push(dep.successor);
    }
    all.sort();
    all.dedup();

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in &all {
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving {node}"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: EntityRef,
    adj: &HashMap<EntityRef, Vec<EntityRef>>,
    visited: &mut HashSet<EntityRef>,
    in_stack: &mut HashSet<EntityRef>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Anchor, DependencyType, EntityKind, ScheduleEntity};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn fs(id: i64, from: i64, to: i64) -> DependencyRecord {
        DependencyRecord {
            id,
            predecessor_type: EntityKind::Project,
            predecessor_id: from,
            predecessor_point: Anchor::End,
            successor_type: EntityKind::Project,
            successor_id: to,
            successor_point: Anchor::Start,
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
            is_active: true,
        }
    }

    fn sample_projects() -> Vec<ProjectRecord> {
        vec![
            ProjectRecord::new(1, d(1), d(10)),
            ProjectRecord::new(2, d(11), d(20)),
            ProjectRecord::new(3, d(21), d(30)),
        ]
    }

    #[test]
    fn test_valid_input() {
        let milestones = vec![MilestoneRecord::new(1, 1, d(5))];
        let deps = vec![fs(1, 1, 2), fs(2, 2, 3)];
        assert!(validate_input(&sample_projects(), &milestones, &deps).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut projects = sample_projects();
        projects.push(ProjectRecord::new(1, d(1), d(2)));
        let deps = vec![fs(1, 1, 2), fs(1, 2, 3)];

        let errors = validate_input(&projects, &[], &deps).unwrap_err();
        let dupes = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::DuplicateId)
            .count();
        assert_eq!(dupes, 2);
    }

    #[test]
    fn test_project_and_milestone_ids_are_separate() {
        let milestones = vec![MilestoneRecord::new(1, 1, d(5))];
        assert!(validate_input(&sample_projects(), &milestones, &[]).is_ok());
    }

    #[test]
    fn test_unknown_project() {
        let milestones = vec![MilestoneRecord::new(1, 42, d(5))];
        let errors = validate_input(&sample_projects(), &milestones, &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownProject));
    }

    #[test]
    fn test_inverted_interval() {
        let projects = vec![ProjectRecord::new(1, d(10), d(1))];
        let errors = validate_input(&projects, &[], &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvertedInterval));
    }

    #[test]
    fn test_self_loop() {
        let mut dep = fs(1, 1, 1);
        dep.predecessor_point = Anchor::Start;
        dep.successor_point = Anchor::Start;
        let errors = validate_input(&sample_projects(), &[], &[dep]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::SelfLoop));
    }

    #[test]
    fn test_invalid_endpoint() {
        let errors = validate_input(&sample_projects(), &[], &[fs(1, 1, 99)]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidEndpoint));
    }

    #[test]
    fn test_cyclic_dependency() {
        // 1 → 2 → 3 → 1
        let deps = vec![fs(1, 1, 2), fs(2, 2, 3), fs(3, 3, 1)];
        let errors = validate_input(&sample_projects(), &[], &deps).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_inactive_dependency_does_not_form_cycle() {
        let mut back = fs(3, 3, 1);
        back.is_active = false;
        let deps = vec![fs(1, 1, 2), fs(2, 2, 3), back];
        assert!(validate_input(&sample_projects(), &[], &deps).is_ok());
    }

    #[test]
    fn test_new_dependency_closing_cycle() {
        let graph = ScheduleGraph::build(
            vec![
                ScheduleEntity::project(1, Some(d(1)), Some(d(10))),
                ScheduleEntity::project(2, Some(d(11)), Some(d(20))),
            ],
            vec![Dependency::finish_to_start(
                1,
                EntityRef::Project(1),
                EntityRef::Project(2),
            )],
        );

        let back = Dependency::finish_to_start(2, EntityRef::Project(2), EntityRef::Project(1));
        let err = validate_new_dependency(&graph, &back).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::CyclicDependency);

        let dangling =
            Dependency::finish_to_start(3, EntityRef::Project(2), EntityRef::Milestone(8));
        let err = validate_new_dependency(&graph, &dangling).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidEndpoint);

        let across = Dependency::new(
            4,
            EntityRef::Project(1),
            EntityRef::Project(1),
            DependencyType::StartToFinish,
        );
        assert!(validate_new_dependency(&graph, &across).is_ok());
    }
}
