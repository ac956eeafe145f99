impl std::fmt::Debug for crate::Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Person")
            .field("id", &format_args!("{}", self.id))
            .field("name", &format_args!("{} {}", self.name, self.family.surname))
            .field("sex", &self.sex)
            .field("generation", &self.generation)
            .field("mother", &self.mother.map(|m| m.to_string()))
            .field("father", &self.father.map(|m| m.to_string()))
            .finish()
    }
}

impl std::fmt::Debug for crate::Roster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roster")
            .field("size", &self.len())
            .field("founders", &self.founders().count())
            //.field("people", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
