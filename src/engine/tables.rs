//! 内置名称表
//!
//! 数组下标即 id，空字符串表示该 id 无名称（0 号条目保留）。

use super::{GameData, NameTable};

const SPECIES: &[&str] = &[
    "", "Bulbasaur", "Ivysaur", "Venusaur", "Charmander", "Charmeleon", "Charizard",
    "Squirtle", "Wartortle", "Blastoise", "Caterpie", "Metapod", "Butterfree", "Weedle",
    "Kakuna", "Beedrill", "Pidgey", "Pidgeotto", "Pidgeot", "Rattata", "Raticate",
    "Spearow", "Fearow", "Ekans", "Arbok", "Pikachu", "Raichu", "Sandshrew", "Sandslash",
    "Nidoran♀", "Nidorina", "Nidoqueen", "Nidoran♂", "Nidorino", "Nidoking", "Clefairy",
    "Clefable", "Vulpix", "Ninetales", "Jigglypuff", "Wigglytuff", "Zubat", "Golbat",
    "Oddish", "Gloom", "Vileplume", "Paras", "Parasect", "Venonat", "Venomoth", "Diglett",
    "Dugtrio", "Meowth", "Persian", "Psyduck", "Golduck", "Mankey", "Primeape", "Growlithe",
    "Arcanine", "Poliwag", "Poliwhirl", "Poliwrath", "Abra", "Kadabra", "Alakazam",
    "Machop", "Machoke", "Machamp", "Bellsprout", "Weepinbell", "Victreebel", "Tentacool",
    "Tentacruel", "Geodude", "Graveler", "Golem", "Ponyta", "Rapidash", "Slowpoke",
    "Slowbro", "Magnemite", "Magneton", "Farfetch’d", "Doduo", "Dodrio", "Seel", "Dewgong",
    "Grimer", "Muk", "Shellder", "Cloyster", "Gastly", "Haunter", "Gengar", "Onix",
    "Drowzee", "Hypno", "Krabby", "Kingler", "Voltorb", "Electrode", "Exeggcute",
    "Exeggutor", "Cubone", "Marowak", "Hitmonlee", "Hitmonchan", "Lickitung", "Koffing",
    "Weezing", "Rhyhorn", "Rhydon", "Chansey", "Tangela", "Kangaskhan", "Horsea", "Seadra",
    "Goldeen", "Seaking", "Staryu", "Starmie", "Mr. Mime", "Scyther", "Jynx", "Electabuzz",
    "Magmar", "Pinsir", "Tauros", "Magikarp", "Gyarados", "Lapras", "Ditto", "Eevee",
    "Vaporeon", "Jolteon", "Flareon", "Porygon", "Omanyte", "Omastar", "Kabuto",
    "Kabutops", "Aerodactyl", "Snorlax", "Articuno", "Zapdos", "Moltres", "Dratini",
    "Dragonair", "Dragonite", "Mewtwo", "Mew",
];

const MOVES: &[&str] = &[
    "", "Pound", "Karate Chop", "Double Slap", "Comet Punch", "Mega Punch", "Pay Day",
    "Fire Punch", "Ice Punch", "Thunder Punch", "Scratch", "Vise Grip", "Guillotine",
    "Razor Wind", "Swords Dance", "Cut", "Gust", "Wing Attack", "Whirlwind", "Fly", "Bind",
    "Slam", "Vine Whip", "Stomp", "Double Kick", "Mega Kick", "Jump Kick", "Rolling Kick",
    "Sand Attack", "Headbutt", "Horn Attack", "Fury Attack", "Horn Drill", "Tackle",
];

const ABILITIES: &[&str] = &[
    "", "Stench", "Drizzle", "Speed Boost", "Battle Armor", "Sturdy", "Damp", "Limber",
    "Sand Veil", "Static", "Volt Absorb", "Water Absorb", "Oblivious", "Cloud Nine",
    "Compound Eyes", "Insomnia", "Color Change", "Immunity", "Flash Fire", "Shield Dust",
    "Own Tempo", "Suction Cups", "Intimidate", "Shadow Tag", "Rough Skin", "Wonder Guard",
    "Levitate", "Effect Spore", "Synchronize", "Clear Body", "Natural Cure",
    "Lightning Rod", "Serene Grace", "Swift Swim", "Chlorophyll", "Illuminate",
];

const ITEMS: &[&str] = &[
    "", "Master Ball", "Ultra Ball", "Great Ball", "Poké Ball", "Safari Ball", "Net Ball",
    "Dive Ball", "Nest Ball", "Repeat Ball", "Timer Ball", "Luxury Ball", "Premier Ball",
    "Dusk Ball", "Heal Ball", "Quick Ball", "Cherish Ball", "Potion", "Antidote",
    "Burn Heal", "Ice Heal", "Awakening", "Paralyze Heal", "Full Restore", "Max Potion",
    "Hyper Potion", "Super Potion", "Full Heal", "Revive", "Max Revive",
];

const NATURES: &[&str] = &[
    "Hardy", "Lonely", "Brave", "Adamant", "Naughty", "Bold", "Docile", "Relaxed", "Impish",
    "Lax", "Timid", "Hasty", "Serious", "Jolly", "Naive", "Modest", "Mild", "Quiet",
    "Bashful", "Rash", "Calm", "Gentle", "Sassy", "Careful", "Quirky",
];

const TYPES: &[&str] = &[
    "Normal", "Fighting", "Flying", "Poison", "Ground", "Rock", "Bug", "Ghost", "Steel",
    "Fire", "Water", "Grass", "Electric", "Psychic", "Ice", "Dragon", "Dark", "Fairy",
];

/// 编译期常量表
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticGameData;

impl StaticGameData {
    fn table(table: NameTable) -> &'static [&'static str] {
        match table {
            NameTable::Species => SPECIES,
            NameTable::Moves => MOVES,
            NameTable::Abilities => ABILITIES,
            NameTable::Items => ITEMS,
            NameTable::Natures => NATURES,
            NameTable::Types => TYPES,
        }
    }

    /// 全国图鉴上限（随物种表）
    pub fn max_species() -> u16 {
        (SPECIES.len() - 1) as u16
    }
}

impl GameData for StaticGameData {
    fn name(&self, table: NameTable, id: u32) -> Option<&str> {
        Self::table(table)
            .get(id as usize)
            .copied()
            .filter(|name| !name.is_empty())
    }

    fn names(&self, table: NameTable) -> Vec<(u32, &str)> {
        Self::table(table)
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(id, name)| (id as u32, *name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let data = StaticGameData;
        assert_eq!(data.name(NameTable::Species, 25), Some("Pikachu"));
        assert_eq!(data.name(NameTable::Natures, 0), Some("Hardy"));
        assert_eq!(data.name(NameTable::Types, 17), Some("Fairy"));
        // 0 号物种保留
        assert_eq!(data.name(NameTable::Species, 0), None);
        assert_eq!(data.name(NameTable::Moves, 9999), None);
    }

    #[test]
    fn test_names_skip_reserved_entries() {
        let data = StaticGameData;
        let species = data.names(NameTable::Species);
        assert_eq!(species.len(), 151);
        assert_eq!(species[0], (1, "Bulbasaur"));
        assert_eq!(data.names(NameTable::Natures).len(), 25);
        assert_eq!(data.names(NameTable::Types).len(), 18);
        assert_eq!(StaticGameData::max_species(), 151);
    }
}
