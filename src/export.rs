/*!
Bulk-import tables for the graph store.

Three CSV tables in the header dialect of the graph store's admin import:
persons and generations as nodes, and the relations between them as edges.
Every person has one `IN_GENERATION` edge. A person with parents has, for each
parent, a `FATHER` or `MOTHER` edge and a `PARENT` edge to the parent, and a
`CHILD` edge from the parent back to them.
 */

use crate::error::{Error, Result};
use crate::{Generation, History, Person, Roster, State};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const PEOPLE_HEADER: &str =
    "personId:ID,name:STRING,sex:STRING,motherId:STRING,fatherId:STRING,familyId:STRING,:LABEL";
pub const GENERATIONS_HEADER: &str =
    "generationId:ID,Type:STRING,Direction:STRING,competitionFactor:FLOAT,:LABEL";
pub const EDGES_HEADER: &str = ":START_ID,:END_ID,:TYPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Father,
    Mother,
    Parent,
    Child,
    InGeneration,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Relation::Father => "FATHER",
            Relation::Mother => "MOTHER",
            Relation::Parent => "PARENT",
            Relation::Child => "CHILD",
            Relation::InGeneration => "IN_GENERATION",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub start: String,
    pub end: String,
    pub relation: Relation,
}

impl Edge {
    fn new(start: impl ToString, end: impl ToString, relation: Relation) -> Self {
        Edge {
            start: start.to_string(),
            end: end.to_string(),
            relation,
        }
    }
}

pub fn person_row(person: &Person) -> String {
    [
        person.id.to_string(),
        person.name.clone(),
        person.sex.to_string(),
        person.mother.map(|m| m.to_string()).unwrap_or_default(),
        person.father.map(|f| f.to_string()).unwrap_or_default(),
        person.family.id.to_string(),
        "Person".to_string(),
    ]
    .iter()
    .join(",")
}

pub fn generation_row(generation: &Generation) -> String {
    format!(
        "{},{},{},{:.6},Generation",
        generation.id, generation.kind, generation.direction, generation.competition
    )
}

/// The edges starting or ending at one person.
pub fn edges(person: &Person) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(7);
    if let Some(father) = person.father {
        edges.push(Edge::new(person.id, father, Relation::Father));
        edges.push(Edge::new(person.id, father, Relation::Parent));
        edges.push(Edge::new(father, person.id, Relation::Child));
    }
    if let Some(mother) = person.mother {
        edges.push(Edge::new(person.id, mother, Relation::Mother));
        edges.push(Edge::new(person.id, mother, Relation::Parent));
        edges.push(Edge::new(mother, person.id, Relation::Child));
    }
    edges.push(Edge::new(
        person.id,
        person.generation,
        Relation::InGeneration,
    ));
    edges
}

pub fn write_people<W: Write>(w: &mut W, roster: &Roster) -> std::io::Result<()> {
    writeln!(w, "{}", PEOPLE_HEADER)?;
    for person in roster {
        writeln!(w, "{}", person_row(person))?;
    }
    Ok(())
}

pub fn write_generations<W: Write>(w: &mut W, history: &History) -> std::io::Result<()> {
    writeln!(w, "{}", GENERATIONS_HEADER)?;
    for generation in history.iter() {
        writeln!(w, "{}", generation_row(generation))?;
    }
    Ok(())
}

pub fn write_edges<W: Write>(w: &mut W, roster: &Roster) -> std::io::Result<()> {
    writeln!(w, "{}", EDGES_HEADER)?;
    for edge in roster.iter().flat_map(edges) {
        writeln!(w, "{},{},{}", edge.start, edge.end, edge.relation)?;
    }
    Ok(())
}

/// Write `people.csv`, `generations.csv` and `edges.csv` into `dir`, creating
/// it if necessary.
pub fn write_imports(dir: &Path, s: &State) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    write_table(&dir.join("people.csv"), |w| write_people(w, &s.roster))?;
    write_table(&dir.join("generations.csv"), |w| {
        write_generations(w, &s.history)
    })?;
    write_table(&dir.join("edges.csv"), |w| write_edges(w, &s.roster))?;
    Ok(())
}

fn write_table<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    log::info!("writing {}…", path.display());
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(file);
    write(&mut w)
        .and_then(|_| w.flush())
        .map_err(|e| Error::io(path, e))
}
