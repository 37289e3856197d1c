//! Org-chart construction.
//!
//! Builds a forest from the flat employee list, where each employee points at
//! its supervisor. Employees without a supervisor, or whose supervisor is not
//! part of the list (e.g. an inactive one), become roots. Employees that can
//! only be reached through a supervisor cycle are never placed in the tree;
//! they are returned in [`OrgChart::unplaced`] instead.

use crate::models::Employee;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One employee and everyone reporting to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgNode {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_profile: Option<String>,
    pub reports: Vec<OrgNode>,
}

impl OrgNode {
    fn leaf(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.full_name.clone(),
            role_id: employee.role_id.clone(),
            disc_profile: employee.disc_profile.clone(),
            reports: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.reports.iter().map(OrgNode::size).sum::<usize>()
    }

    /// Levels in this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.reports.iter().map(OrgNode::depth).max().unwrap_or(0)
    }

    #[cfg(test)]
    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        for report in &self.reports {
            report.collect_ids(out);
        }
    }
}

/// The rendered hierarchy of a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrgChart {
    pub roots: Vec<OrgNode>,
    /// Ids of employees caught in (or below) a supervisor cycle.
    pub unplaced: Vec<String>,
}

impl OrgChart {
    /// Total number of placed employees.
    pub fn len(&self) -> usize {
        self.roots.iter().map(OrgNode::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.roots.iter().map(OrgNode::depth).max().unwrap_or(0)
    }

    /// Ids of all placed employees, depth-first.
    #[cfg(test)]
    pub fn ids(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len());
        for root in &self.roots {
            root.collect_ids(&mut out);
        }
        out
    }

    /// Find a placed node by employee id.
    #[cfg(test)]
    pub fn find(&self, id: &str) -> Option<&OrgNode> {
        fn walk<'a>(node: &'a OrgNode, id: &str) -> Option<&'a OrgNode> {
            if node.id == id {
                return Some(node);
            }
            node.reports.iter().find_map(|r| walk(r, id))
        }
        self.roots.iter().find_map(|r| walk(r, id))
    }
}

/// Build the org chart from a flat employee list.
pub fn build_org_chart(employees: &[Employee]) -> OrgChart {
    let known: HashSet<&str> = employees.iter().map(|e| e.id.as_str()).collect();

    let mut children: HashMap<&str, Vec<&Employee>> = HashMap::new();
    let mut roots: Vec<&Employee> = Vec::new();

    for employee in employees {
        match employee.supervisor_id.as_deref().filter(|s| !s.is_empty()) {
            Some(supervisor) if known.contains(supervisor) => {
                children.entry(supervisor).or_default().push(employee);
            }
            Some(supervisor) => {
                debug!(
                    "Supervisor {} of {} is not in the list, placing at root",
                    supervisor, employee.id
                );
                roots.push(employee);
            }
            None => roots.push(employee),
        }
    }

    let mut visited: HashSet<&str> = HashSet::with_capacity(employees.len());
    let mut chart = OrgChart::default();

    for root in roots {
        if visited.insert(root.id.as_str()) {
            chart.roots.push(build_node(root, &children, &mut visited));
        }
    }

    chart.unplaced = employees
        .iter()
        .filter(|e| !visited.contains(e.id.as_str()))
        .map(|e| e.id.clone())
        .collect();

    if !chart.unplaced.is_empty() {
        warn!(
            "Supervisor cycle detected, {} employee(s) left out of the org chart: {}",
            chart.unplaced.len(),
            chart.unplaced.join(", ")
        );
    }

    chart
}

/// `employee` must already be marked as visited.
fn build_node<'a>(
    employee: &'a Employee,
    children: &HashMap<&str, Vec<&'a Employee>>,
    visited: &mut HashSet<&'a str>,
) -> OrgNode {
    let mut node = OrgNode::leaf(employee);

    if let Some(reports) = children.get(employee.id.as_str()) {
        for &report in reports {
            if visited.insert(report.id.as_str()) {
                node.reports.push(build_node(report, children, visited));
            }
        }
    }

    node
}

/// Render the placed employees as an indented text tree.
pub fn render_text(chart: &OrgChart) -> String {
    let mut out = String::new();

    for root in &chart.roots {
        out.push_str(&node_label(root));
        out.push('\n');
        render_reports(&root.reports, "", &mut out);
    }

    out
}

fn render_reports(reports: &[OrgNode], prefix: &str, out: &mut String) {
    for (i, node) in reports.iter().enumerate() {
        let last = i + 1 == reports.len();
        let (branch, extension) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&node_label(node));
        out.push('\n');

        let child_prefix = format!("{}{}", prefix, extension);
        render_reports(&node.reports, &child_prefix, out);
    }
}

fn node_label(node: &OrgNode) -> String {
    match node.disc_profile.as_deref() {
        Some(profile) if !profile.is_empty() => format!("{} [{}]", node.name, profile),
        _ => node.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, supervisor: Option<&str>) -> Employee {
        Employee {
            id: id.to_string(),
            company_id: "c1".to_string(),
            full_name: format!("Employee {}", id),
            supervisor_id: supervisor.map(String::from),
            role_id: None,
            disc_profile: None,
            disc_scores: None,
            active: true,
            hired_on: None,
        }
    }

    #[test]
    fn test_builds_nested_forest() {
        let employees = vec![
            employee("ceo", None),
            employee("cto", Some("ceo")),
            employee("dev1", Some("cto")),
            employee("dev2", Some("cto")),
            employee("cfo", Some("ceo")),
            employee("advisor", None),
        ];

        let chart = build_org_chart(&employees);

        assert_eq!(chart.roots.len(), 2);
        assert_eq!(chart.roots[0].id, "ceo");
        assert_eq!(chart.roots[1].id, "advisor");
        let cto = chart.find("cto").unwrap();
        assert_eq!(cto.reports.len(), 2);
        assert_eq!(cto.reports[0].id, "dev1");
        assert_eq!(chart.depth(), 3);
        assert!(chart.unplaced.is_empty());
    }

    #[test]
    fn test_every_employee_appears_exactly_once() {
        // Children listed before their supervisors.
        let employees = vec![
            employee("e5", Some("e4")),
            employee("e4", Some("e2")),
            employee("e3", Some("e1")),
            employee("e2", Some("e1")),
            employee("e1", None),
            employee("e6", Some("e1")),
        ];

        let chart = build_org_chart(&employees);
        let mut ids = chart.ids();
        ids.sort_unstable();

        assert_eq!(ids, vec!["e1", "e2", "e3", "e4", "e5", "e6"]);
        assert_eq!(chart.len(), employees.len());

        // Each node sits under its designated supervisor.
        for e in &employees {
            match &e.supervisor_id {
                Some(sup) => {
                    let parent = chart.find(sup).unwrap();
                    assert!(parent.reports.iter().any(|r| r.id == e.id));
                }
                None => assert!(chart.roots.iter().any(|r| r.id == e.id)),
            }
        }
    }

    #[test]
    fn test_dangling_supervisor_becomes_root() {
        let employees = vec![employee("a", Some("gone")), employee("b", Some("a"))];

        let chart = build_org_chart(&employees);

        assert_eq!(chart.roots.len(), 1);
        assert_eq!(chart.roots[0].id, "a");
        assert_eq!(chart.len(), 2);
    }

    #[test]
    fn test_cycle_terminates_and_reports_unplaced() {
        let employees = vec![
            employee("root", None),
            employee("a", Some("b")),
            employee("b", Some("a")),
            employee("under_cycle", Some("a")),
            employee("self", Some("self")),
        ];

        let chart = build_org_chart(&employees);

        assert_eq!(chart.len(), 1);
        assert_eq!(chart.unplaced, vec!["a", "b", "under_cycle", "self"]);
    }

    #[test]
    fn test_empty_input() {
        let chart = build_org_chart(&[]);
        assert!(chart.is_empty());
        assert_eq!(chart.depth(), 0);
        assert_eq!(render_text(&chart), "");
    }

    #[test]
    fn test_render_text() {
        let mut lead = employee("lead", None);
        lead.full_name = "Ana".to_string();
        lead.disc_profile = Some("DI".to_string());
        let mut first = employee("x", Some("lead"));
        first.full_name = "Bruno".to_string();
        let mut second = employee("y", Some("lead"));
        second.full_name = "Carla".to_string();
        let mut deep = employee("z", Some("x"));
        deep.full_name = "Davi".to_string();

        let chart = build_org_chart(&[lead, first, second, deep]);
        let text = render_text(&chart);

        assert_eq!(text, "Ana [DI]\n├── Bruno\n│   └── Davi\n└── Carla\n");
    }
}
