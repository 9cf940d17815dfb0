// src/dag/graph.rs

use std::collections::{BTreeMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::ConfigFile;
use crate::dag::plan::Plan;
use crate::dag::task::{builtin_tasks, TaskName, TaskSpec, BUNDLE, IMAGES, STYLES, TEMPLATES};
use crate::errors::{AssetwatchError, Result};
use crate::types::ReloadKind;

/// Named tasks plus their `then` edges.
///
/// Construction rejects unknown edge targets and cycles, so every plan built
/// from a `TaskGraph` terminates.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, TaskSpec>,
    /// All task names, topologically ordered along `then` edges.
    order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn new(specs: Vec<TaskSpec>) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for spec in specs {
            if tasks.contains_key(&spec.name) {
                return Err(AssetwatchError::ConfigError(format!(
                    "task '{}' defined twice",
                    spec.name
                )));
            }
            tasks.insert(spec.name.clone(), spec);
        }

        for spec in tasks.values() {
            for next in &spec.then {
                if !tasks.contains_key(next) {
                    return Err(AssetwatchError::ConfigError(format!(
                        "task '{}' is followed by unknown task '{}'",
                        spec.name, next
                    )));
                }
            }
        }

        let order = {
            // Edge direction: task -> follower.
            let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
            for name in tasks.keys() {
                graph.add_node(name.as_str());
            }
            for spec in tasks.values() {
                for next in &spec.then {
                    graph.add_edge(spec.name.as_str(), next.as_str(), ());
                }
            }

            match toposort(&graph, None) {
                Ok(order) => order.into_iter().map(str::to_string).collect::<Vec<_>>(),
                Err(cycle) => {
                    return Err(AssetwatchError::DagCycle(format!(
                        "cycle involving task '{}'",
                        cycle.node_id()
                    )));
                }
            }
        };

        Ok(Self { tasks, order })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(builtin_tasks(cfg)?)
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in topological order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// A task followed by everything reachable through `then`, topologically.
    pub fn chain(&self, name: &str) -> Result<Plan> {
        if !self.contains(name) {
            return Err(AssetwatchError::TaskNotFound(name.to_string()));
        }

        let mut reachable: HashSet<&str> = HashSet::new();
        let mut frontier = VecDeque::from([name]);
        while let Some(current) = frontier.pop_front() {
            if !reachable.insert(current) {
                continue;
            }
            if let Some(spec) = self.tasks.get(current) {
                frontier.extend(spec.then.iter().map(String::as_str));
            }
        }

        let steps: Vec<Plan> = self
            .order
            .iter()
            .filter(|n| reachable.contains(n.as_str()))
            .map(Plan::task)
            .collect();

        Ok(Plan::series(steps))
    }

    /// Run `names` one after another, exactly as listed.
    pub fn series(&self, names: &[TaskName]) -> Result<Plan> {
        let mut steps = Vec::with_capacity(names.len());
        for name in names {
            if !self.contains(name) {
                return Err(AssetwatchError::TaskNotFound(name.clone()));
            }
            steps.push(Plan::task(name));
        }
        Ok(Plan::series(steps))
    }

    /// The full build: the four transformer tasks side by side. The bundle
    /// runs alone; `minify` is only reached through `scripts`.
    pub fn default_plan(&self) -> Result<Plan> {
        let mut steps = Vec::with_capacity(4);
        for name in [STYLES, IMAGES, BUNDLE, TEMPLATES] {
            if !self.contains(name) {
                return Err(AssetwatchError::TaskNotFound(name.to_string()));
            }
            steps.push(Plan::task(name));
        }
        Ok(Plan::parallel(steps))
    }

    /// Strongest reload requested by any of `names`.
    pub fn reload_kind<S: AsRef<str>>(&self, names: &[S]) -> ReloadKind {
        names
            .iter()
            .filter_map(|n| self.tasks.get(n.as_ref()))
            .map(|spec| spec.reload)
            .max()
            .unwrap_or(ReloadKind::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::source::SourceSet;
    use crate::transform::{TaskReport, TransformContext, TransformError, Transformer};

    #[derive(Debug)]
    struct Nop;

    impl Transformer for Nop {
        fn label(&self) -> &'static str {
            "nop"
        }

        fn transform(
            &self,
            _ctx: &TransformContext,
            _sources: &SourceSet,
        ) -> std::result::Result<TaskReport, TransformError> {
            Ok(TaskReport::default())
        }
    }

    fn spec(name: &str) -> TaskSpec {
        TaskSpec::new(name, "src/*", "dist", Arc::new(Nop))
    }

    #[test]
    fn chain_follows_then_edges_in_order() {
        let graph = TaskGraph::new(vec![spec("c"), spec("a").then("b"), spec("b").then("c")]).unwrap();
        assert_eq!(graph.chain("a").unwrap().to_string(), "series(a -> b -> c)");
        assert_eq!(graph.chain("c").unwrap().to_string(), "c");
    }

    #[test]
    fn cycle_is_rejected() {
        let err = TaskGraph::new(vec![spec("a").then("b"), spec("b").then("a")]).unwrap_err();
        assert!(matches!(err, AssetwatchError::DagCycle(_)));
    }

    #[test]
    fn unknown_follower_is_rejected() {
        let err = TaskGraph::new(vec![spec("a").then("ghost")]).unwrap_err();
        assert!(matches!(err, AssetwatchError::ConfigError(_)));
    }

    #[test]
    fn series_rejects_unknown_tasks() {
        let graph = TaskGraph::new(vec![spec("a")]).unwrap();
        let err = graph.series(&["a".to_string(), "zz".to_string()]).unwrap_err();
        assert!(matches!(err, AssetwatchError::TaskNotFound(name) if name == "zz"));
    }

    #[test]
    fn reload_kind_takes_strongest() {
        let graph = TaskGraph::new(vec![
            spec("css").reload(ReloadKind::Style),
            spec("html").reload(ReloadKind::Full),
            spec("img"),
        ])
        .unwrap();
        assert_eq!(graph.reload_kind(&["img"]), ReloadKind::None);
        assert_eq!(graph.reload_kind(&["img", "css"]), ReloadKind::Style);
        assert_eq!(graph.reload_kind(&["css", "html"]), ReloadKind::Full);
    }
}
