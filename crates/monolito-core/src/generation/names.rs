//! Name generation utilities

use crate::components::Name;
use rand::Rng;

/// Generate a random villager name
pub fn generate_name(rng: &mut impl Rng) -> Name {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];

    Name::new(given, family)
}

/// Pick an epithet for a legendary villager
pub fn generate_epithet(rng: &mut impl Rng) -> &'static str {
    EPITHETS[rng.gen_range(0..EPITHETS.len())]
}

// Would be loaded from the settlement's data files once localization lands
static GIVEN_NAMES: &[&str] = &[
    "Lucía", "Mateo", "Inés", "Tomás", "Carmen", "Álvaro", "Rocío", "Julián", "Pilar", "Gonzalo",
    "Marina", "Ramiro", "Elena", "Bruno", "Nuria", "Ignacio", "Amparo", "Hugo", "Leonor",
    "Rodrigo", "Olalla", "Fermín", "Sabela", "Iker", "Ximena", "Anselmo", "Candela", "Teodoro",
    "Aitana", "Benito",
];

static FAMILY_NAMES: &[&str] = &[
    "Ferrer", "Garrido", "Molina", "Quiroga", "Sandoval", "Robles", "Herrera", "Iglesias",
    "Castro", "Navarro", "Peralta", "Salazar", "Valdés", "Cifuentes", "Ortega", "Barrios",
    "Montoya", "Villalba", "Arriaga", "Beltrán", "Carrasco", "Durán", "Escobar", "Figueroa",
];

static EPITHETS: &[&str] = &[
    "el Iluminado",
    "la Vidente",
    "el Guardián del Monolito",
    "la Voz de la Piedra",
    "el Peregrino",
    "la Custodia",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_name() {
        let mut rng = rand::thread_rng();
        let name = generate_name(&mut rng);

        assert!(!name.given.is_empty());
        assert!(!name.family.is_empty());
        assert!(name.epithet.is_none());
    }

    #[test]
    fn test_name_variety() {
        let mut rng = StdRng::seed_from_u64(7);
        let names: Vec<Name> = (0..200).map(|_| generate_name(&mut rng)).collect();

        let unique_given: std::collections::HashSet<_> = names.iter().map(|n| &n.given).collect();
        let unique_family: std::collections::HashSet<_> = names.iter().map(|n| &n.family).collect();

        assert!(unique_given.len() > 10);
        assert!(unique_family.len() > 10);
    }

    #[test]
    fn test_seeded_names_repeat() {
        let a = generate_name(&mut StdRng::seed_from_u64(42));
        let b = generate_name(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
