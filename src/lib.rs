/*!
Model Description
=================

This model description follows the ODD (Overview, Design concept, Details)
protocol (Grimm et al., 2006; Grimm et al., 2010). As far as useful, the
documentation of the items below is the model description, and the code next to
it is the model.

# 1. Purpose

The genealogy model synthesizes a multi-generation population of individuals,
couples and family lines, to be bulk-imported into a graph store. It is not a
demographic model. Its only aim is to produce family trees that neither die out
immediately nor explode within a handful of generations, while still looking
irregular. That is achieved by a competition factor, a single scalar per
generation, which oscillates between two thresholds and sets the fecundity of
each generation's couples.

 */

use rand::Rng;
use rustc_hash::FxHashMap;
use serde_derive::{Deserialize, Serialize};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub mod catalog;
pub mod cli;
mod debug;
pub mod error;
pub mod export;
mod fecundity;
pub mod parameters;

pub use error::{Error, Result};
pub use fecundity::Fecundity;
pub use parameters::Parameters;

use catalog::Catalog;

/**
# 2. Entities, state variables, and scales

The model runs in discrete time. One time step is one generation: every person
is born into exactly one generation and may only reproduce with partners born
into the same generation, during the following step. Generations are counted
from 0, the generation of the two founders.

 */
pub type GenerationId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "MALE"),
            Sex::Female => write!(f, "FEMALE"),
        }
    }
}

/**
## 2.1 Identities

Persons and families are identified by UUIDs. The graph store receives
generations, persons and families in one shared id space, and UUIDs cannot
collide with the small integer ids of the generations. The UUIDs are built
from bytes of the simulation's random source, so a seeded run reproduces its
ids as well.

 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(uuid::Uuid);

impl PersonId {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        PersonId(uuid::Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(uuid::Uuid);

impl FamilyId {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        FamilyId(uuid::Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl std::fmt::Display for FamilyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/**
## 2.2 Families

A family is a surname line. Only the founders' families are drawn from the
surname catalog; every other person inherits the family of their father at
birth, so a family is founded once and then passed on unchanged.

 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub surname: String,
    /// The generation the family was founded in.
    pub generation: GenerationId,
}

/**
## 2.3 Persons

Persons never change after their birth. Parents are referenced by id and
resolved through the [`Roster`]. The founders have no parents at all, which is
different from having parents with empty fields.

 */
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub sex: Sex,
    pub family: Family,
    /// The generation the person was born into.
    pub generation: GenerationId,
    pub mother: Option<PersonId>,
    pub father: Option<PersonId>,
}

impl Person {
    pub fn is_founder(&self) -> bool {
        self.mother.is_none() && self.father.is_none()
    }
}

/**
The roster holds every person ever born, in order of birth. Nobody is ever
removed from it: which persons may still reproduce is tracked separately in
the [`State`].

 */
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Person>", into = "Vec<Person>")]
pub struct Roster {
    people: Vec<Person>,
    index: FxHashMap<PersonId, usize>,
}

impl Roster {
    pub fn push(&mut self, person: Person) -> Result<PersonId> {
        let id = person.id;
        if self.index.contains_key(&id) {
            return Err(Error::DuplicatePerson(id));
        }
        self.index.insert(id, self.people.len());
        self.people.push(person);
        Ok(id)
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.index.get(&id).map(|&i| &self.people[i])
    }

    /// Like [`Roster::get`], for ids that must be known.
    pub fn resolve(&self, id: PersonId) -> Result<&Person> {
        self.get(id).ok_or(Error::UnknownPerson(id))
    }

    pub fn mother(&self, person: &Person) -> Option<&Person> {
        person.mother.and_then(|id| self.get(id))
    }

    pub fn father(&self, person: &Person) -> Option<&Person> {
        person.father.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Person> {
        self.people.iter()
    }

    pub fn founders(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|p| p.is_founder())
    }

    pub fn non_founders(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|p| !p.is_founder())
    }
}

impl From<Vec<Person>> for Roster {
    fn from(people: Vec<Person>) -> Self {
        let index = people.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        Roster { people, index }
    }
}

impl From<Roster> for Vec<Person> {
    fn from(roster: Roster) -> Self {
        roster.people
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Person;
    type IntoIter = std::slice::Iter<'a, Person>;
    fn into_iter(self) -> Self::IntoIter {
        self.people.iter()
    }
}

/**
## 2.4 Couples

A man and a woman of the same generation who have children together. Couples
are higher-level agents created ad-hoc in each time step; they do not persist
beyond the step that formed them. A couple carries the family its children
inherit and the fecundity of its generation.

 */
#[derive(Debug, Clone, PartialEq)]
pub struct Couple {
    pub mother: PersonId,
    pub father: PersonId,
    pub family: Family,
    pub fecundity: Fecundity,
}

/**
## 2.5 Generations

Each generation records the state of the competition controller (Submodel 7.3)
after it was advanced for that generation: the competition factor, the type of
the generation, which fixes the fecundity of the generation's couples, and the
direction in which the factor will be pushed next.

 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationType {
    Decline,
    Stable,
    Growth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Decline,
    Growth,
}

impl std::fmt::Display for GenerationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationType::Decline => write!(f, "DECLINE"),
            GenerationType::Stable => write!(f, "STABLE"),
            GenerationType::Growth => write!(f, "GROWTH"),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Decline => write!(f, "DECLINE"),
            Direction::Growth => write!(f, "GROWTH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub id: GenerationId,
    pub competition: f64,
    #[serde(rename = "type")]
    pub kind: GenerationType,
    pub direction: Direction,
}

/**
The history is the sequence of all generations so far, starting with
generation 0. Entries are only ever appended, and the ids count up from 0
without gaps, which is checked again when a stored history is read.

 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Generation>", into = "Vec<Generation>")]
pub struct History(Vec<Generation>);

impl History {
    pub fn new(genesis: Generation) -> Self {
        History(vec![genesis])
    }

    /// The most recent generation.
    pub fn current(&self) -> &Generation {
        &self.0[self.0.len() - 1]
    }

    fn push(&mut self, generation: Generation) {
        debug_assert_eq!(generation.id, self.current().id + 1);
        self.0.push(generation)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Generation> {
        self.0.iter()
    }
}

impl std::convert::TryFrom<Vec<Generation>> for History {
    type Error = String;

    fn try_from(generations: Vec<Generation>) -> std::result::Result<Self, Self::Error> {
        if generations.is_empty() {
            return Err("a history contains at least generation 0".to_string());
        }
        for (i, g) in generations.iter().enumerate() {
            if g.id as usize != i {
                return Err(format!("generation {} found at position {}", g.id, i));
            }
        }
        Ok(History(generations))
    }
}

impl From<History> for Vec<Generation> {
    fn from(history: History) -> Self {
        history.0
    }
}

/**
## 2.6 State

The state of the model consists of the roster, the history, the persons of the
most recent generation who are available for pairing in the next step, split by
sex, and the status of the run. The state also stores a copy of the model
parameters, so that a stored run describes itself.

 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Running,
    /// The most recent generation has no members, so no further couples can
    /// form.
    Extinct,
    /// The configured number of generations has been simulated.
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub roster: Roster,
    pub history: History,
    /// Men of the most recent generation.
    pub males: Vec<PersonId>,
    /// Women of the most recent generation.
    pub females: Vec<PersonId>,
    pub status: Status,
    pub p: Parameters,
}

impl State {
    /// Number of persons available for pairing in the next step.
    pub fn active(&self) -> usize {
        self.males.len() + self.females.len()
    }
}

/**
# 3. Process overview and scheduling

The model progresses in discrete time steps of one generation each. A step
turns generation *i* into generation *i+1* as follows.

1. The competition controller is advanced (Submodel 7.3), giving the
   competition factor, type and direction of generation *i+1*.
2. The men and women of generation *i* are paired into couples
   (Submodel 7.1). The couples' fecundity is the one of generation *i*'s type.
3. Every couple has a Poisson-distributed number of children (Submodel 7.2),
   who are born into generation *i+1*.
4. The children are added to the roster, and they replace generation *i* as
   the persons available for pairing.

The run ends when a step leaves no children, or after the configured number of
generations. If both happen in the same step, the population counts as extinct.

 */
pub fn step<R: Rng + ?Sized>(s: &mut State, catalog: &Catalog, rng: &mut R) -> Result<Status> {
    let current = *s.history.current();
    let next = submodels::competition::advance(&current, &s.p);

    let couples = submodels::pairing::pair(
        &mut s.males,
        &mut s.females,
        &s.roster,
        s.p.fecundity(current.kind),
        rng,
    )?;
    log::debug!(
        "Generation {}: {} couples with fecundity {:?}",
        current.id,
        couples.len(),
        s.p.fecundity(current.kind)
    );

    let mut males = vec![];
    let mut females = vec![];
    for couple in couples.iter() {
        for child in submodels::offspring::children(couple, next.id, catalog, rng) {
            match child.sex {
                Sex::Male => males.push(child.id),
                Sex::Female => females.push(child.id),
            }
            s.roster.push(child)?;
        }
    }
    s.males = males;
    s.females = females;
    s.history.push(next);

    s.status = if s.active() == 0 {
        Status::Extinct
    } else if next.id >= s.p.generations {
        Status::Complete
    } else {
        Status::Running
    };
    Ok(s.status)
}

/**
Steps are repeated while the run is neither extinct nor complete. Observation
(Section 4.5) happens after each step.

 */
pub fn run<R: Rng + ?Sized>(
    mut s: State,
    catalog: &Catalog,
    rng: &mut R,
    o: &observation::Settings,
) -> Result<State> {
    while s.status == Status::Running {
        step(&mut s, catalog, rng)?;
        let t = s.history.current().id;

        if (o.log_every > 0) && (t % o.log_every == 0) {
            observation::log_generation(&s);
        }
        if (o.store_every > 0) && (t % o.store_every == 0) && !o.statefile.is_empty() {
            store_state(&s, Path::new(&o.statefile))?;
        }
    }
    match s.status {
        Status::Extinct => log::info!(
            "Family has died out in generation {}",
            s.history.current().id
        ),
        Status::Complete => log::info!(
            "Ended after {} generations with {} persons",
            s.history.current().id,
            s.roster.len()
        ),
        Status::Running => {}
    }
    Ok(s)
}

/**
# 4. Design concepts

## 4.1 Basic principles

The population is regulated by negative feedback, not by resources. A
competition factor stands in for the pressure a population puts on its
environment. It is pushed towards 0 or towards 1 by repeated exponentiation,
and whenever it leaves the band between two thresholds, the direction of the
push is reversed. The fecundity of a generation follows from where the factor
lies relative to that band.

## 4.2 Emergence

The size of the population, the number of surviving surname lines and the
shape of the family trees emerge from the pairing and the offspring draws.
Extinction in the first generations is a common outcome, because the founders
form a single couple.

## 4.3 Stochasticity

Pairing is a uniformly random matching, the number of children is Poisson
distributed, and the sex of every child is a fair coin. Names, surnames and
identities are drawn uniformly. All randomness comes from one random source
passed into the model, so a seeded source reproduces a run exactly.

## 4.4 Collectives

Couples (Section 2.4) are the only collectives. Families are lines of descent,
not agents.

## 4.5 Observation

 */
pub mod observation {
    use crate::*;
    use rustc_hash::FxHashSet;

    /**
    Which observations happen how often, in generations. A `store_every` of 0,
    or an empty `statefile`, disables intermediate storage of the state.
    */
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub log_every: GenerationId,
        pub store_every: GenerationId,
        pub statefile: String,
    }

    impl Default for Settings {
        fn default() -> Self {
            Settings {
                log_every: 1,
                store_every: 0,
                statefile: String::new(),
            }
        }
    }

    /**
    To follow the dynamics of a run, we log the controller state of each
    generation together with the size of the roster and the number of persons
    available for pairing.
    */
    pub fn log_generation(s: &State) {
        let g = s.history.current();
        log::info!(
            "GENERATION: {} - TYPE: {} - Dir: {} - Competition Factor: {:.6} - Population: {} - Active: {} - Lines: {}",
            g.id,
            g.kind,
            g.direction,
            g.competition,
            s.roster.len(),
            s.active(),
            living_lines(s)
        );
        if log::log_enabled!(log::Level::Debug) {
            let mut census: Vec<_> = surname_census(&s.roster).into_iter().collect();
            census.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            log::debug!("Surnames: {:?}", census);
        }
    }

    /// Number of persons ever born, by surname.
    pub fn surname_census(roster: &Roster) -> FxHashMap<String, usize> {
        let mut census = FxHashMap::default();
        for person in roster {
            *census.entry(person.family.surname.clone()).or_insert(0) += 1;
        }
        census
    }

    /// Number of distinct families among the persons available for pairing.
    pub fn living_lines(s: &State) -> usize {
        s.males
            .iter()
            .chain(s.females.iter())
            .filter_map(|id| s.roster.get(*id))
            .map(|p| p.family.id)
            .collect::<FxHashSet<_>>()
            .len()
    }
}

/**
# 5. Initialization

The initial state holds generation 0 and the two founders, one man and one
woman. Each founder has a family of their own, drawn from the surname catalog,
and a first name drawn for their sex. Generation 0 has the seed competition
factor, and both its type and its direction are GROWTH.

 */
pub fn initialization<R: Rng + ?Sized>(
    p: Parameters,
    catalog: &Catalog,
    rng: &mut R,
) -> Result<State> {
    p.validate()?;

    let genesis = Generation {
        id: 0,
        competition: p.seed_competition,
        kind: GenerationType::Growth,
        direction: Direction::Growth,
    };

    let mut roster = Roster::default();
    let adam = roster.push(founder(Sex::Male, genesis.id, catalog, rng))?;
    let eve = roster.push(founder(Sex::Female, genesis.id, catalog, rng))?;

    let status = if p.generations == 0 {
        Status::Complete
    } else {
        Status::Running
    };
    Ok(State {
        roster,
        history: History::new(genesis),
        males: vec![adam],
        females: vec![eve],
        status,
        p,
    })
}

fn founder<R: Rng + ?Sized>(
    sex: Sex,
    generation: GenerationId,
    catalog: &Catalog,
    rng: &mut R,
) -> Person {
    Person {
        id: PersonId::random(rng),
        name: catalog.first_name(sex, rng).to_string(),
        sex,
        family: catalog.family(generation, rng),
        generation,
        mother: None,
        father: None,
    }
}

/**
# 6. Input Data

The model reads two flat tables before the run: first names tagged with a sex,
and surnames. See [`catalog::Catalog::parse`] for their format.

# 7. Submodels

 */
pub mod submodels {
    /**
    ## 7.1 Pairing

    Men and women of the same generation are matched uniformly at random: both
    groups are shuffled independently, and the i-th man is paired with the
    i-th woman. Whoever is left over in the larger group stays single, and
    nobody gets a second chance in a later generation. The children of a
    couple inherit the father's family.

     */
    pub mod pairing {
        use crate::{Couple, Fecundity, PersonId, Result, Roster};
        use rand::seq::SliceRandom;
        use rand::Rng;

        pub fn pair<R: Rng + ?Sized>(
            males: &mut [PersonId],
            females: &mut [PersonId],
            roster: &Roster,
            fecundity: Fecundity,
            rng: &mut R,
        ) -> Result<Vec<Couple>> {
            males.shuffle(rng);
            females.shuffle(rng);
            males
                .iter()
                .zip(females.iter())
                .map(|(&father, &mother)| {
                    Ok(Couple {
                        mother,
                        father,
                        family: roster.resolve(father)?.family.clone(),
                        fecundity,
                    })
                })
                .collect()
        }
    }

    /**
    ## 7.2 Offspring

    The number of children of a couple is the number of arrivals of a
    homogeneous Poisson process with rate λ (the couple's fecundity) in a unit
    interval. The arrivals are simulated one by one: waiting times between
    arrivals are exponentially distributed with rate λ, and every arrival that
    happens before the elapsed time exceeds 1 is a child. The count is thus
    Poisson(λ) distributed.

    Each child is a boy or a girl with equal probability, gets a first name
    drawn for that sex, and inherits the couple's family.

     */
    pub mod offspring {
        use crate::catalog::Catalog;
        use crate::{Couple, Fecundity, GenerationId, Person, PersonId, Sex};
        use rand::Rng;
        use rand_distr::{Distribution, Exp1};

        pub fn arrivals<R: Rng + ?Sized>(fecundity: Fecundity, rng: &mut R) -> u32 {
            let rate = f64::from(fecundity.rate());
            let mut n = 0;
            let mut elapsed = 0.;
            loop {
                let gap: f64 = Exp1.sample(rng);
                elapsed += gap / rate;
                if elapsed > 1. {
                    return n;
                }
                n += 1;
            }
        }

        pub fn children<R: Rng + ?Sized>(
            couple: &Couple,
            generation: GenerationId,
            catalog: &Catalog,
            rng: &mut R,
        ) -> Vec<Person> {
            let n = arrivals(couple.fecundity, rng);
            (0..n)
                .map(|_| {
                    let sex = if rng.gen_bool(0.5) {
                        Sex::Male
                    } else {
                        Sex::Female
                    };
                    Person {
                        id: PersonId::random(rng),
                        name: catalog.first_name(sex, rng).to_string(),
                        sex,
                        family: couple.family.clone(),
                        generation,
                        mother: Some(couple.mother),
                        father: Some(couple.father),
                    }
                })
                .collect()
        }
    }

    /**
    ## 7.3 Competition

    The competition factor c of a generation is computed from the previous
    one by a damping transform with exponent δ: in direction DECLINE,
    c' = c^(1/δ), which pulls the factor towards 1; in direction GROWTH,
    c' = c^δ, which pushes it towards 0.

    The new factor is then classified. Above the decline threshold, the
    generation is of type DECLINE and the direction becomes GROWTH. Below the
    growth threshold, the generation is of type GROWTH and the direction
    becomes DECLINE. In between, the generation is STABLE and the direction is
    kept. The type fixes the fecundity of the generation's couples: by default
    1 for DECLINE, 2 for STABLE and 4 for GROWTH.

    With the default parameters, starting from generation 0:

    ```rust
    use model::submodels::competition::advance;
    use model::{Direction, Generation, GenerationType, Parameters};

    let p = Parameters::default();
    let g0 = Generation {
        id: 0,
        competition: 0.2,
        kind: GenerationType::Growth,
        direction: Direction::Growth,
    };
    let g1 = advance(&g0, &p);
    assert_eq!(g1.id, 1);
    assert!((g1.competition - 0.2_f64.powf(1.5)).abs() < 1e-12);
    assert_eq!(g1.kind, GenerationType::Growth);
    assert_eq!(g1.direction, Direction::Decline);
    assert_eq!(p.fecundity(g1.kind).rate(), 4);
    ```
     */
    pub mod competition {
        use crate::{Direction, Generation, GenerationType, Parameters};

        pub fn damp(competition: f64, direction: Direction, delta: f64) -> f64 {
            match direction {
                Direction::Decline => competition.powf(1. / delta),
                Direction::Growth => competition.powf(delta),
            }
        }

        pub fn classify(
            competition: f64,
            direction: Direction,
            p: &Parameters,
        ) -> (GenerationType, Direction) {
            if competition > p.decline_threshold {
                (GenerationType::Decline, Direction::Growth)
            } else if competition < p.growth_threshold {
                (GenerationType::Growth, Direction::Decline)
            } else {
                (GenerationType::Stable, direction)
            }
        }

        pub fn advance(previous: &Generation, p: &Parameters) -> Generation {
            let competition = damp(previous.competition, previous.direction, p.competition_delta);
            let (kind, direction) = classify(competition, previous.direction, p);
            Generation {
                id: previous.id + 1,
                competition,
                kind,
                direction,
            }
        }
    }
}

pub fn store_state(state: &State, statefile: &Path) -> Result<()> {
    let file = File::create(statefile).map_err(|e| Error::io(statefile, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, state)?;
    writer.flush().map_err(|e| Error::io(statefile, e))?;
    log::info!("Stored state to {}", statefile.display());
    Ok(())
}

pub fn load_state(statefile: &Path) -> Result<State> {
    let file = File::open(statefile).map_err(|e| Error::io(statefile, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests;
