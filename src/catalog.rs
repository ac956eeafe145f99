//! Pools of first names and surnames, and random draws from them.

use crate::error::{Error, Result};
use crate::{Family, FamilyId, GenerationId, Sex};
use rand::Rng;
use std::path::Path;

/// A first name, tagged with the sex it is given to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub value: String,
    pub sex: Sex,
}

/**
The name catalog. Construction guarantees that every pool holds at least one
entry, so the draws cannot fail.
 */
#[derive(Debug, Clone)]
pub struct Catalog {
    male_names: Vec<String>,
    female_names: Vec<String>,
    surnames: Vec<String>,
}

impl Catalog {
    pub fn new<N>(names: N, surnames: Vec<String>) -> Result<Catalog>
    where
        N: IntoIterator<Item = Name>,
    {
        let (male, female): (Vec<Name>, Vec<Name>) =
            names.into_iter().partition(|n| n.sex == Sex::Male);
        if male.is_empty() {
            return Err(Error::EmptyPool("male first names"));
        }
        if female.is_empty() {
            return Err(Error::EmptyPool("female first names"));
        }
        if surnames.is_empty() {
            return Err(Error::EmptyPool("surnames"));
        }
        Ok(Catalog {
            male_names: male.into_iter().map(|n| n.value).collect(),
            female_names: female.into_iter().map(|n| n.value).collect(),
            surnames,
        })
    }

    /**
    Parse the two flat tables: rows of `name,SEX` and rows of `surname`.

    Only `MALE` marks a male name, any other value (or none at all) a female
    one. Each table ends at its first blank row.

    ```rust
    # use model::catalog::Catalog;
    let catalog = Catalog::parse("Ada,FEMALE\nAbel,MALE\n\nIgnored,MALE\n", "Lovelace\n").unwrap();
    assert_eq!(catalog.pool_sizes(), (1, 1, 1));
    ```
     */
    pub fn parse(first_names: &str, last_names: &str) -> Result<Catalog> {
        let names: Vec<Name> = rows(first_names)
            .map(|row| {
                let mut values = row.split(',');
                let value = values.next().unwrap_or_default().to_string();
                let sex = match values.next() {
                    Some("MALE") => Sex::Male,
                    _ => Sex::Female,
                };
                Name { value, sex }
            })
            .collect();
        let surnames = rows(last_names).map(String::from).collect();
        Catalog::new(names, surnames)
    }

    pub fn load(first_names: &Path, last_names: &Path) -> Result<Catalog> {
        let first = std::fs::read_to_string(first_names).map_err(|e| Error::io(first_names, e))?;
        let last = std::fs::read_to_string(last_names).map_err(|e| Error::io(last_names, e))?;
        let catalog = Catalog::parse(&first, &last)?;
        let (m, f, s) = catalog.pool_sizes();
        log::info!(
            "Loaded {} male and {} female first names, {} surnames",
            m,
            f,
            s
        );
        Ok(catalog)
    }

    /// Number of male names, female names and surnames.
    pub fn pool_sizes(&self) -> (usize, usize, usize) {
        (
            self.male_names.len(),
            self.female_names.len(),
            self.surnames.len(),
        )
    }

    /// Draw a first name for the given sex, uniformly from its pool.
    pub fn first_name<R: Rng + ?Sized>(&self, sex: Sex, rng: &mut R) -> &str {
        let pool = match sex {
            Sex::Male => &self.male_names,
            Sex::Female => &self.female_names,
        };
        &pool[rng.gen_range(0..pool.len())]
    }

    /// Found a new family: a uniformly drawn surname under a fresh identity,
    /// tagged with the generation it is founded in.
    pub fn family<R: Rng + ?Sized>(&self, generation: GenerationId, rng: &mut R) -> Family {
        let surname = &self.surnames[rng.gen_range(0..self.surnames.len())];
        Family {
            id: FamilyId::random(rng),
            surname: surname.clone(),
            generation,
        }
    }
}

fn rows(table: &str) -> impl Iterator<Item = &str> {
    table
        .split('\n')
        .map(|row| row.strip_suffix('\r').unwrap_or(row))
        .take_while(|row| !row.is_empty())
}
