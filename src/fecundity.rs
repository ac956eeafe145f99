/**
Fecundity is the rate of the Poisson process that produces a couple's
children, i.e. the expected number of children per couple.

The offspring sampler counts arrivals of that process in a unit interval, so a
rate of zero would never produce an arrival that ends the count. A
`Fecundity` can therefore not be zero: every constructor clamps to 1.

```rust
use model::Fecundity;
assert_eq!(Fecundity::new(4).rate(), 4);
assert_eq!(Fecundity::new(0).rate(), 1);
assert_eq!("2".parse::<Fecundity>().unwrap(), Fecundity::new(2));
```
*/
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Fecundity {
    lambda: u32,
}

impl Fecundity {
    pub fn new(lambda: u32) -> Self {
        if lambda == 0 {
            log::warn!("Fecundity 0 would never end the offspring draw, using 1 instead");
            Fecundity { lambda: 1 }
        } else {
            Fecundity { lambda }
        }
    }

    pub fn rate(self) -> u32 {
        self.lambda
    }
}

impl From<u32> for Fecundity {
    fn from(lambda: u32) -> Self {
        Fecundity::new(lambda)
    }
}

impl From<Fecundity> for u32 {
    fn from(f: Fecundity) -> u32 {
        f.lambda
    }
}

/**
Rates are read from the command line like any other parameter.
 */
impl FromStr for Fecundity {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Fecundity::new(u32::from_str(s)?))
    }
}

impl std::fmt::Debug for Fecundity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "λ={}", self.lambda)
    }
}

impl std::fmt::Display for Fecundity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.lambda.fmt(f)
    }
}

use serde_derive::{Deserialize, Serialize};
use std::num::ParseIntError;
use std::str::FromStr;
