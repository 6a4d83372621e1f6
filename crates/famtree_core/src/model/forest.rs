//! Arena-backed person forest.
//!
//! # Responsibility
//! - Own every person node in one arena keyed by `PersonId`.
//! - Keep root order and per-node child order.
//! - Convert to and from the nested `PersonRecord` snapshot shape.
//!
//! # Invariants
//! - Every arena node is reachable from exactly one root entry or one
//!   parent's child list.
//! - Root names are unique; inserting a root with an existing name replaces
//!   the old root (and frees its subtree) in the same slot.
//! - Descendant names are not deduplicated.

use crate::model::person::{PersonId, PersonRecord};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PersonNode {
    name: String,
    children: Vec<PersonId>,
}

/// In-memory forest of person nodes.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<PersonId, PersonNode>,
    roots: Vec<PersonId>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a forest from persisted root records.
    ///
    /// Later roots win over earlier roots with the same name. Ids that are
    /// nil or already used are replaced with fresh ones.
    pub fn from_records(records: Vec<PersonRecord>) -> Self {
        let mut forest = Self::new();
        for record in records {
            let name = record.name.clone();
            let id = forest.adopt_record(record);
            forest.place_root(id, &name);
        }
        forest
    }

    /// Converts the forest into nested root records, in root order.
    pub fn to_records(&self) -> Vec<PersonRecord> {
        self.roots().map(|root| root.to_record()).collect()
    }

    /// Total number of nodes, roots and descendants.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Looks up one node by id.
    pub fn get(&self, id: PersonId) -> Option<PersonView<'_>> {
        self.nodes.get(&id).map(|node| PersonView {
            forest: self,
            id,
            node,
        })
    }

    /// Iterates root nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = PersonView<'_>> + '_ {
        self.roots.iter().filter_map(|id| self.get(*id))
    }

    /// First root in insertion order, used as the display root.
    pub fn first_root(&self) -> Option<PersonView<'_>> {
        self.roots().next()
    }

    /// Resolves a root by exact name.
    pub fn root_id(&self, name: &str) -> Option<PersonId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|node| node.name == name))
    }

    /// Resolves a node by exact name.
    ///
    /// Root names are checked first. Otherwise each root's descendants are
    /// searched depth-first in pre-order, roots in insertion order, and the
    /// first match wins.
    pub fn find(&self, name: &str) -> Option<PersonId> {
        if let Some(id) = self.root_id(name) {
            return Some(id);
        }
        self.roots
            .iter()
            .find_map(|root| self.find_descendant(*root, name))
    }

    /// Pre-order traversal of the whole forest, yielding `(depth, node)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            forest: self,
            stack: self.roots.iter().rev().map(|id| (0, *id)).collect(),
        }
    }

    /// Inserts a new root named `name` and returns its id.
    pub fn insert_root(&mut self, name: String) -> PersonId {
        let id = self.alloc(name.clone());
        self.place_root(id, &name);
        id
    }

    /// Appends a new node as the last child of `parent`.
    ///
    /// Returns `None` when `parent` is not in the arena.
    pub fn append_child(&mut self, parent: PersonId, name: String) -> Option<PersonId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.alloc(name);
        self.nodes.get_mut(&parent)?.children.push(id);
        Some(id)
    }

    /// Removes one root entry and frees its subtree.
    pub fn remove_root(&mut self, id: PersonId) -> bool {
        let Some(position) = self.roots.iter().position(|root| *root == id) else {
            return false;
        };
        self.roots.remove(position);
        self.free_subtree(id);
        true
    }

    /// Renames a root, replacing any other root already using `new_name`.
    ///
    /// The renamed root keeps its own position in root order.
    pub fn rename_root(&mut self, id: PersonId, new_name: String) -> bool {
        if !self.roots.contains(&id) {
            return false;
        }
        if let Some(existing) = self.root_id(&new_name) {
            if existing != id {
                self.remove_root(existing);
            }
        }
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.name = new_name;
                true
            }
            None => false,
        }
    }

    /// Removes every direct child of every root whose name equals `name`.
    ///
    /// Deeper descendants are not inspected. Returns the number of removed
    /// child entries.
    pub fn prune_root_children_named(&mut self, name: &str) -> usize {
        let mut removed = Vec::new();
        for root in &self.roots {
            let Some(node) = self.nodes.get(root) else {
                continue;
            };
            let matching: Vec<PersonId> = node
                .children
                .iter()
                .copied()
                .filter(|child| self.nodes.get(child).is_some_and(|c| c.name == name))
                .collect();
            if matching.is_empty() {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(root) {
                node.children.retain(|child| !matching.contains(child));
            }
            removed.extend(matching);
        }
        let count = removed.len();
        for id in removed {
            self.free_subtree(id);
        }
        count
    }

    /// Renames every direct child of every root whose name equals
    /// `old_name`. Returns the number of renamed nodes.
    pub fn rename_root_children_named(&mut self, old_name: &str, new_name: &str) -> usize {
        let matching: Vec<PersonId> = self
            .roots
            .iter()
            .filter_map(|root| self.nodes.get(root))
            .flat_map(|node| node.children.iter().copied())
            .filter(|child| {
                self.nodes
                    .get(child)
                    .is_some_and(|c| c.name == old_name)
            })
            .collect();
        for id in &matching {
            if let Some(node) = self.nodes.get_mut(id) {
                node.name = new_name.to_string();
            }
        }
        matching.len()
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    fn alloc(&mut self, name: String) -> PersonId {
        let mut id = Uuid::new_v4();
        while self.nodes.contains_key(&id) {
            id = Uuid::new_v4();
        }
        self.nodes.insert(
            id,
            PersonNode {
                name,
                children: Vec::new(),
            },
        );
        id
    }

    fn place_root(&mut self, id: PersonId, name: &str) {
        let existing = self
            .roots
            .iter()
            .position(|root| self.nodes.get(root).is_some_and(|node| node.name == name));
        match existing {
            Some(position) => {
                let replaced = std::mem::replace(&mut self.roots[position], id);
                self.free_subtree(replaced);
            }
            None => self.roots.push(id),
        }
    }

    fn adopt_record(&mut self, record: PersonRecord) -> PersonId {
        let id = if record.id.is_nil() || self.nodes.contains_key(&record.id) {
            self.alloc(record.name)
        } else {
            self.nodes.insert(
                record.id,
                PersonNode {
                    name: record.name,
                    children: Vec::new(),
                },
            );
            record.id
        };
        for child in record.children {
            let child_id = self.adopt_record(child);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn find_descendant(&self, start: PersonId, name: &str) -> Option<PersonId> {
        let mut stack: Vec<PersonId> = self
            .nodes
            .get(&start)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn free_subtree(&mut self, id: PersonId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
    }
}

/// Borrowed read view of one node.
#[derive(Debug, Clone, Copy)]
pub struct PersonView<'a> {
    forest: &'a Forest,
    id: PersonId,
    node: &'a PersonNode,
}

impl<'a> PersonView<'a> {
    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.node.name.as_str()
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = PersonView<'a>> + 'a {
        let forest = self.forest;
        self.node
            .children
            .iter()
            .filter_map(move |id| forest.get(*id))
    }

    /// Names of direct children in order.
    pub fn child_names(&self) -> Vec<&'a str> {
        self.children().map(|child| child.name()).collect()
    }

    /// Builds the nested snapshot record for this subtree.
    pub fn to_record(&self) -> PersonRecord {
        PersonRecord {
            id: self.id,
            name: self.node.name.clone(),
            children: self.children().map(|child| child.to_record()).collect(),
        }
    }
}

/// Pre-order forest traversal created by [`Forest::walk`].
pub struct Walk<'a> {
    forest: &'a Forest,
    stack: Vec<(usize, PersonId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, PersonView<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, id)) = self.stack.pop() {
            let Some(view) = self.forest.get(id) else {
                continue;
            };
            self.stack
                .extend(view.node.children.iter().rev().map(|child| (depth + 1, *child)));
            return Some((depth, view));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::Forest;
    use crate::model::person::PersonRecord;

    fn sample() -> Forest {
        // Alice -> [Bob -> [Dana], Carol]; Eve -> [Bob]
        let alice = PersonRecord::new("Alice")
            .with_child(PersonRecord::new("Bob").with_child(PersonRecord::new("Dana")))
            .with_child(PersonRecord::new("Carol"));
        let eve = PersonRecord::new("Eve").with_child(PersonRecord::new("Bob"));
        Forest::from_records(vec![alice, eve])
    }

    #[test]
    fn find_prefers_root_then_preorder_descendants() {
        let forest = sample();
        let bob = forest.find("Bob").unwrap();
        let alice = forest.get(forest.root_id("Alice").unwrap()).unwrap();
        assert_eq!(alice.children().next().unwrap().id(), bob);
        assert!(forest.find("Dana").is_some());
        assert!(forest.find("Zed").is_none());
    }

    #[test]
    fn insert_root_with_existing_name_replaces_slot_and_frees_subtree() {
        let mut forest = sample();
        assert_eq!(forest.len(), 6);
        let replacement = forest.insert_root("Alice".to_string());
        assert_eq!(forest.root_count(), 2);
        assert_eq!(forest.first_root().unwrap().id(), replacement);
        assert_eq!(forest.first_root().unwrap().child_count(), 0);
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn prune_only_touches_direct_children_of_roots() {
        let mut forest = sample();
        forest.insert_root("Dana".to_string());
        let pruned = forest.prune_root_children_named("Dana");
        assert_eq!(pruned, 0);
        assert_eq!(forest.prune_root_children_named("Bob"), 2);
        assert!(forest.find("Bob").is_none());
        // Dana under Bob went with him; the root Dana stays.
        assert_eq!(forest.walk().filter(|(_, p)| p.name() == "Dana").count(), 1);
    }

    #[test]
    fn walk_reports_depth_in_preorder() {
        let forest = sample();
        let visited: Vec<(usize, String)> = forest
            .walk()
            .map(|(depth, person)| (depth, person.name().to_string()))
            .collect();
        assert_eq!(
            visited,
            vec![
                (0, "Alice".to_string()),
                (1, "Bob".to_string()),
                (2, "Dana".to_string()),
                (1, "Carol".to_string()),
                (0, "Eve".to_string()),
                (1, "Bob".to_string()),
            ]
        );
    }

    #[test]
    fn from_records_replaces_duplicate_ids() {
        let shared = PersonRecord::new("A");
        let mut twin = PersonRecord::new("B");
        twin.id = shared.id;
        let forest = Forest::from_records(vec![shared, twin]);
        assert_eq!(forest.len(), 2);
        assert_ne!(forest.root_id("A"), forest.root_id("B"));
    }
}
