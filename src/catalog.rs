//! Read-only content catalog: scenario labs and the command drill deck.
//!
//! Built once at startup from TOML-configured entries plus built-in seeds.
//! Config entries win on id collisions; invalid entries are skipped with an error log.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info, instrument};

use crate::config::LabConfig;
use crate::domain::{Category, Challenge, CommandCard, Difficulty};
use crate::seeds::{seed_commands, seed_scenarios};

#[derive(Clone, Debug, Default)]
pub struct Catalog {
  scenarios: Vec<Arc<Challenge>>,
  by_id: HashMap<String, Arc<Challenge>>,
  commands: Vec<CommandCard>,
}

impl Catalog {
  #[instrument(level = "info", skip_all)]
  pub fn build(cfg: Option<&LabConfig>) -> Self {
    let mut catalog = Catalog::default();

    if let Some(cfg) = cfg {
      for sc in &cfg.scenarios {
        catalog.insert_scenario(sc.clone().into_challenge());
      }
      for card in &cfg.commands {
        catalog.insert_command(card.clone());
      }
    }

    // Always insert built-in seeds, but don't overwrite existing ids.
    for c in seed_scenarios() {
      catalog.insert_scenario(c);
    }
    for card in seed_commands() {
      catalog.insert_command(card);
    }

    let mut count_by_cat: HashMap<Category, (usize, usize)> = HashMap::new();
    for c in &catalog.scenarios {
      count_by_cat.entry(c.category).or_default().0 += 1;
    }
    for card in &catalog.commands {
      count_by_cat.entry(card.category).or_default().1 += 1;
    }
    for (cat, (scenarios, commands)) in count_by_cat {
      info!(target: "catalog", category = cat.as_str(), scenarios, commands, "Startup catalog inventory");
    }
    catalog
  }

  fn insert_scenario(&mut self, c: Challenge) {
    if self.by_id.contains_key(&c.id) {
      return;
    }
    if let Err(e) = c.validate() {
      error!(target: "catalog", id = %c.id, error = %e, "Skipping scenario");
      return;
    }
    let c = Arc::new(c);
    self.by_id.insert(c.id.clone(), Arc::clone(&c));
    self.scenarios.push(c);
  }

  fn insert_command(&mut self, card: CommandCard) {
    if self.commands.iter().any(|c| c.id == card.id) {
      return;
    }
    if card.command.trim().is_empty() {
      error!(target: "catalog", id = %card.id, "Skipping command card: empty command");
      return;
    }
    self.commands.push(card);
  }

  pub fn scenario(&self, id: &str) -> Option<Arc<Challenge>> {
    self.by_id.get(id).cloned()
  }

  pub fn scenarios(&self) -> &[Arc<Challenge>] {
    &self.scenarios
  }

  pub fn commands(&self, category: Option<Category>) -> Vec<&CommandCard> {
    self.commands
      .iter()
      .filter(|c| category.map_or(true, |cat| c.category == cat))
      .collect()
  }

  /// Assemble a drill from random command cards, never repeating a card id.
  /// Returns `None` when no card matches the filter.
  pub fn build_drill<R: Rng + ?Sized>(&self, category: Option<Category>, rng: &mut R) -> Option<Challenge> {
    let mut pool = self.commands(category);
    pool.shuffle(rng);
    let difficulty = pool.iter().map(|c| c.difficulty).max().unwrap_or(Difficulty::Easy);
    let mut used: HashSet<&str> = HashSet::with_capacity(pool.len());
    let mut steps = Vec::with_capacity(pool.len());
    for card in pool {
      if used.insert(card.id.as_str()) {
        steps.push(card.to_step());
      }
    }
    if steps.is_empty() {
      return None;
    }

    let scope = category.map_or("all", |c| c.as_str());
    Some(Challenge {
      id: format!("drill-{scope}"),
      title: format!("Command drill ({scope})"),
      description: "Type the correct command for each prompt.".into(),
      category: category.unwrap_or(Category::Linux),
      difficulty,
      reward_points: 0,
      steps,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::parse_lab_config;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn seeds_only_catalog() {
    let catalog = Catalog::build(None);
    assert_eq!(catalog.scenarios().len(), 4);
    assert!(catalog.scenario("scenario-git-revert").is_some());
    assert_eq!(catalog.commands(Some(Category::Git)).len(), 6);
  }

  #[test]
  fn config_entries_win_and_bad_ones_are_skipped() {
    let src = r#"
[[scenarios]]
id = "scenario-git-revert"
title = "Custom revert"
category = "git"
reward_points = 10
[[scenarios.steps]]
instruction = "revert"
expected_answer = "git revert HEAD"

[[scenarios]]
id = "empty"
title = "No steps"
category = "linux"
"#;
    let cfg = parse_lab_config(src).unwrap();
    let catalog = Catalog::build(Some(&cfg));
    assert_eq!(catalog.scenario("scenario-git-revert").unwrap().title, "Custom revert");
    assert!(catalog.scenario("empty").is_none());
    assert_eq!(catalog.scenarios().len(), 4);
  }

  #[test]
  fn drill_uses_each_card_once() {
    let catalog = Catalog::build(None);
    let mut rng = StdRng::seed_from_u64(7);
    let drill = catalog.build_drill(Some(Category::Docker), &mut rng).unwrap();
    assert_eq!(drill.steps.len(), 6);
    let answers: HashSet<_> = drill.steps.iter().map(|s| s.expected_answer.clone()).collect();
    assert_eq!(answers.len(), 6);
    assert!(drill.steps.iter().all(|s| s.reward_points.is_some()));
    assert_eq!(drill.id, "drill-docker");
    assert_eq!(catalog.commands(Some(Category::Docker)).len(), 6);
  }

  #[test]
  fn drill_over_everything() {
    let catalog = Catalog::build(None);
    let mut rng = StdRng::seed_from_u64(1);
    let drill = catalog.build_drill(None, &mut rng).unwrap();
    assert_eq!(drill.steps.len(), 26);
    assert_eq!(drill.difficulty, Difficulty::Hard);
  }

  fn card(id: &str, n: usize) -> CommandCard {
    CommandCard {
      id: id.into(),
      description: format!("card {n}"),
      command: format!("echo {n}"),
      alternates: Vec::new(),
      hint: String::new(),
      category: Category::Linux,
      difficulty: Difficulty::Easy,
      xp: 5,
    }
  }

  #[test]
  fn drill_skips_repeated_ids_and_covers_large_decks() {
    let mut catalog = Catalog::default();
    catalog.commands = (0..2000).map(|n| card(&format!("c{n}"), n)).collect();
    catalog.commands.push(card("c7", 9999));
    let mut rng = StdRng::seed_from_u64(3);
    let drill = catalog.build_drill(Some(Category::Linux), &mut rng).unwrap();
    assert_eq!(drill.steps.len(), 2000);
    let answers: HashSet<_> = drill.steps.iter().map(|s| s.expected_answer.as_str()).collect();
    assert_eq!(answers.len(), 2000);
  }

  #[test]
  fn empty_pool_builds_nothing() {
    let catalog = Catalog::default();
    let mut rng = StdRng::seed_from_u64(1);
    assert!(catalog.build_drill(None, &mut rng).is_none());
  }
}
