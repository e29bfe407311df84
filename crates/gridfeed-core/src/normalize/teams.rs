// Team code lookup. Rows whose team code is not in the table never produce a
// record.

use std::collections::BTreeMap;

/// Team code the upstream data uses for unsigned players.
pub const FREE_AGENT: &str = "FA";

/// The 32 NFL franchises keyed by their current code.
pub const NFL_TEAMS: [(&str, &str); 32] = [
    ("ARI", "Arizona Cardinals"),
    ("ATL", "Atlanta Falcons"),
    ("BAL", "Baltimore Ravens"),
    ("BUF", "Buffalo Bills"),
    ("CAR", "Carolina Panthers"),
    ("CHI", "Chicago Bears"),
    ("CIN", "Cincinnati Bengals"),
    ("CLE", "Cleveland Browns"),
    ("DAL", "Dallas Cowboys"),
    ("DEN", "Denver Broncos"),
    ("DET", "Detroit Lions"),
    ("GB", "Green Bay Packers"),
    ("HOU", "Houston Texans"),
    ("IND", "Indianapolis Colts"),
    ("JAX", "Jacksonville Jaguars"),
    ("KC", "Kansas City Chiefs"),
    ("LV", "Las Vegas Raiders"),
    ("LAC", "Los Angeles Chargers"),
    ("LAR", "Los Angeles Rams"),
    ("MIA", "Miami Dolphins"),
    ("MIN", "Minnesota Vikings"),
    ("NE", "New England Patriots"),
    ("NO", "New Orleans Saints"),
    ("NYG", "New York Giants"),
    ("NYJ", "New York Jets"),
    ("PHI", "Philadelphia Eagles"),
    ("PIT", "Pittsburgh Steelers"),
    ("SEA", "Seattle Seahawks"),
    ("SF", "San Francisco 49ers"),
    ("TB", "Tampa Bay Buccaneers"),
    ("TEN", "Tennessee Titans"),
    ("WAS", "Washington Commanders"),
];

/// A resolved team: canonical code plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub code: String,
    pub name: String,
}

/// Code → display name table with optional legacy-code aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTable {
    names: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl Default for TeamTable {
    fn default() -> Self {
        Self::new(
            NFL_TEAMS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string())),
            std::iter::empty(),
        )
    }
}

impl TeamTable {
    /// Build a table. Codes and alias keys are stored uppercased.
    pub fn new(
        names: impl IntoIterator<Item = (String, String)>,
        aliases: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(code, name)| (code.trim().to_uppercase(), name))
                .collect(),
            aliases: aliases
                .into_iter()
                .map(|(from, to)| (from.trim().to_uppercase(), to.trim().to_uppercase()))
                .collect(),
        }
    }

    /// Replace the alias map, keeping the names.
    pub fn with_aliases(self, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        let names = self.names;
        Self::new(names, aliases)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve a raw team code. Returns `None` for missing codes, the
    /// free-agent sentinel, and anything not in the table.
    pub fn resolve(&self, raw: Option<&str>) -> Option<Team> {
        let upper = raw.map(str::trim).filter(|s| !s.is_empty())?.to_uppercase();
        if upper == FREE_AGENT {
            return None;
        }

        let code = self.aliases.get(&upper).cloned().unwrap_or(upper);
        let name = self.names.get(&code)?.clone();
        Some(Team { code, name })
    }
}
