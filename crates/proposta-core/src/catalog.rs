//! Catalog accessor
//!
//! A [`Catalog`] ingests the caller's product list once: specifications are
//! parsed, aliased and typed up front, and names are normalized for the
//! keyword fallback used when a catalog has no role tags yet.

use crate::product::{FunctionalRole, Product};
use crate::quantity::ceil_units;
use crate::specs::{
    get_product_specs, BatterySpecs, InverterSpecs, MaterialSpecs, PanelSpecs, ProductSpecs,
    SpecBag, SpecKind, SPEC_SCHEMA_VERSION,
};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Lowercase, strip accents and collapse punctuation to single spaces
pub fn normalize_name(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    NON_ALNUM.replace_all(&folded, " ").trim().to_string()
}

const SHORT_KEYWORD_LEN: usize = 3;

fn word_matches(token: &str, keyword: &str) -> bool {
    if keyword.len() <= SHORT_KEYWORD_LEN {
        token == keyword
    } else {
        token.starts_with(keyword)
    }
}

/// A product with its specs resolved at ingestion
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub product: Product,
    pub specs: SpecBag,
    pub typed: ProductSpecs,
    pub schema_version: u32,
    search_tokens: Vec<String>,
}

impl CatalogEntry {
    pub fn ingest(product: Product) -> Self {
        let specs = get_product_specs(&product);
        let typed = ProductSpecs::from_bag(SpecKind::of(&product), &specs);
        let search_tokens = normalize_name(&format!(
            "{} {}",
            product.name,
            product.code.as_deref().unwrap_or_default()
        ))
        .split_whitespace()
        .map(str::to_string)
        .collect();
        Self {
            product,
            specs,
            typed,
            schema_version: SPEC_SCHEMA_VERSION,
            search_tokens,
        }
    }

    pub fn id(&self) -> &str {
        &self.product.id
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }

    pub fn price(&self) -> f64 {
        self.product.base_price
    }

    pub fn kind(&self) -> SpecKind {
        self.typed.kind()
    }

    /// Material view of the specs; non-material kinds read the raw bag
    pub fn material(&self) -> MaterialSpecs {
        match &self.typed {
            ProductSpecs::Material(m) => m.clone(),
            _ => MaterialSpecs::from_bag(&self.specs),
        }
    }

    pub fn panel(&self) -> PanelSpecs {
        match &self.typed {
            ProductSpecs::SolarPanel(p) => p.clone(),
            _ => PanelSpecs::from_bag(&self.specs),
        }
    }

    pub fn inverter(&self) -> InverterSpecs {
        match &self.typed {
            ProductSpecs::Inverter(i) => i.clone(),
            _ => InverterSpecs::from_bag(&self.specs),
        }
    }

    pub fn battery(&self) -> BatterySpecs {
        match &self.typed {
            ProductSpecs::Battery(b) => b.clone(),
            _ => BatterySpecs::from_bag(&self.specs),
        }
    }

    /// True when every keyword matches a word of the name or code.
    ///
    /// Keywords are compared per normalized word, never inside one: "st"
    /// does not match "resistente". Short codes (up to three characters)
    /// must equal a word; longer keywords may also prefix one, so
    /// "bateria" matches "baterias".
    pub fn matches_keywords(&self, keywords: &[&str]) -> bool {
        !keywords.is_empty()
            && keywords.iter().all(|k| {
                let wanted = normalize_name(k);
                !wanted.is_empty()
                    && wanted
                        .split_whitespace()
                        .all(|w| self.search_tokens.iter().any(|t| word_matches(t, w)))
            })
    }

    /// Units needed to cover `area` with this product's coverage
    pub fn units_for_area(&self, area: f64, waste_factor: f64) -> u32 {
        let coverage = self.material().coverage().unwrap_or_else(|| {
            tracing::warn!(
                product = %self.product.id,
                "no coverage_area/yield_per_unit spec, assuming 1 m² per unit"
            );
            1.0
        });
        ceil_units(area * waste_factor, coverage)
    }
}

/// How to find the product that plays a role in a calculation
#[derive(Debug, Clone, Copy)]
pub struct ProductQuery<'q> {
    pub role: FunctionalRole,
    pub category: &'q str,
    pub keywords: &'q [&'q str],
    pub kind: Option<SpecKind>,
}

impl<'q> ProductQuery<'q> {
    pub fn new(role: FunctionalRole, category: &'q str) -> Self {
        Self {
            role,
            category,
            keywords: &[],
            kind: None,
        }
    }

    pub fn keywords(mut self, keywords: &'q [&'q str]) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn kind(mut self, kind: SpecKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Ingested, read-only product catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(products: &[Product]) -> Self {
        Self::from_products(products.to_vec())
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            entries: products.into_iter().map(CatalogEntry::ingest).collect(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.product.is_active)
    }

    pub fn in_category(&self, category: &str) -> Vec<&CatalogEntry> {
        self.active()
            .filter(|e| e.product.category.eq_ignore_ascii_case(category))
            .collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        !self.in_category(category).is_empty()
    }

    pub fn by_role(&self, role: FunctionalRole) -> Vec<&CatalogEntry> {
        self.active()
            .filter(|e| e.product.functional_role == Some(role))
            .collect()
    }

    /// First active product whose code contains `fragment` (case-insensitive)
    pub fn by_code_fragment(&self, fragment: &str) -> Option<&CatalogEntry> {
        let needle = fragment.to_lowercase();
        self.active().find(|e| {
            e.product
                .code
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        })
    }

    /// First active product (optionally within a category) matching all keywords
    pub fn by_name_keywords(
        &self,
        category: Option<&str>,
        keywords: &[&str],
    ) -> Option<&CatalogEntry> {
        self.active()
            .filter(|e| category.map_or(true, |c| e.product.category.eq_ignore_ascii_case(c)))
            .find(|e| e.matches_keywords(keywords))
    }

    /// All products that can play the queried role.
    ///
    /// Role tags within the category win; without them, the category is
    /// searched by keywords and then by spec kind.
    pub fn candidates(&self, query: &ProductQuery<'_>) -> Vec<&CatalogEntry> {
        let in_category = self.in_category(query.category);
        let tagged: Vec<&CatalogEntry> = in_category
            .iter()
            .copied()
            .filter(|e| e.product.functional_role == Some(query.role))
            .collect();
        if !tagged.is_empty() {
            return tagged;
        }
        let by_keywords: Vec<&CatalogEntry> = in_category
            .iter()
            .copied()
            .filter(|e| e.product.functional_role.is_none() && e.matches_keywords(query.keywords))
            .collect();
        if !by_keywords.is_empty() {
            return by_keywords;
        }
        match query.kind {
            Some(kind) => in_category
                .into_iter()
                .filter(|e| e.product.functional_role.is_none() && e.kind() == kind)
                .collect(),
            None => Vec::new(),
        }
    }

    /// First candidate for the role
    pub fn locate(&self, query: &ProductQuery<'_>) -> Option<&CatalogEntry> {
        self.candidates(query).into_iter().next()
    }
}

/// Outcome of a capacity-sized product search
#[derive(Debug, Clone, Copy)]
pub struct SizedSelection<'a> {
    pub entry: &'a CatalogEntry,
    pub rating: f64,
    /// False when no candidate fell inside the tolerance band
    pub within_band: bool,
}

/// "Smallest adequate" search.
///
/// Candidates are scanned by ascending rating; the first whose rating lies
/// in `[requirement, requirement * max_ratio]` is chosen. Otherwise the
/// candidate closest to the requirement (absolute difference) is returned.
/// Candidates without a rating are ignored.
pub fn smallest_adequate<'a, F>(
    candidates: &[&'a CatalogEntry],
    requirement: f64,
    max_ratio: f64,
    rating: F,
) -> Option<SizedSelection<'a>>
where
    F: Fn(&CatalogEntry) -> Option<f64>,
{
    let mut rated: Vec<(&'a CatalogEntry, f64)> = candidates
        .iter()
        .filter_map(|e| rating(e).filter(|r| *r > 0.0).map(|r| (*e, r)))
        .collect();
    rated.sort_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((entry, r)) = rated
        .iter()
        .find(|(_, r)| *r >= requirement && *r <= requirement * max_ratio)
    {
        return Some(SizedSelection {
            entry,
            rating: *r,
            within_band: true,
        });
    }

    rated
        .into_iter()
        .min_by(|a, b| (a.1 - requirement).abs().total_cmp(&(b.1 - requirement).abs()))
        .map(|(entry, r)| {
            tracing::warn!(
                product = %entry.product.id,
                requirement,
                rating = r,
                "no product inside the sizing band, using closest match"
            );
            SizedSelection {
                entry,
                rating: r,
                within_band: false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::categories;
    use serde_json::json;

    fn inverter(id: &str, power: f64) -> Product {
        Product::new(id, format!("Inversor {}", id), categories::SOLAR, 3000.0)
            .with_role(FunctionalRole::Inverter)
            .with_specifications(json!({ "power": power }))
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Massa p/ Junta - 20kg"), "massa p junta 20kg");
        assert_eq!(normalize_name("Módulo Fotovoltaico"), "modulo fotovoltaico");
    }

    #[test]
    fn test_inactive_products_are_skipped() {
        let catalog = Catalog::new(&[
            Product::new("a", "OSB 9mm", categories::SHINGLE, 50.0).inactive(),
            Product::new("b", "OSB 11mm", categories::SHINGLE, 60.0),
        ]);
        let found = catalog.by_name_keywords(Some(categories::SHINGLE), &["osb"]).unwrap();
        assert_eq!(found.id(), "b");
        assert_eq!(catalog.in_category(categories::SHINGLE).len(), 1);
    }

    #[test]
    fn test_role_wins_over_keywords() {
        let catalog = Catalog::new(&[
            Product::new("name-match", "Telha Oakridge Onyx", categories::SHINGLE, 40.0),
            Product::new("tagged", "Telha Duration", categories::SHINGLE, 45.0)
                .with_role(FunctionalRole::ShingleMain),
        ]);
        let query = ProductQuery::new(FunctionalRole::ShingleMain, categories::SHINGLE)
            .keywords(&["oakridge"]);
        assert_eq!(catalog.locate(&query).unwrap().id(), "tagged");
    }

    #[test]
    fn test_roles_are_scoped_to_the_category() {
        let catalog = Catalog::new(&[
            Product::new("hybrid", "Inversor Hibrido 5 kW", categories::BATTERY_BACKUP, 6900.0)
                .with_role(FunctionalRole::Inverter),
            Product::new("grid", "Inversor On-Grid 5 kW", categories::SOLAR, 5200.0),
        ]);
        let query =
            ProductQuery::new(FunctionalRole::Inverter, categories::SOLAR).keywords(&["inversor"]);
        assert_eq!(catalog.locate(&query).unwrap().id(), "grid");
    }

    #[test]
    fn test_keyword_fallback_requires_all_keywords() {
        let catalog = Catalog::new(&[
            Product::new("a", "Massa corrida", categories::DRYWALL, 30.0),
            Product::new("b", "Massa para Junta 20kg", categories::DRYWALL, 80.0),
        ]);
        let query = ProductQuery::new(FunctionalRole::JointCompound, categories::DRYWALL)
            .keywords(&["massa", "junta"]);
        assert_eq!(catalog.locate(&query).unwrap().id(), "b");
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let catalog = Catalog::new(&[
            Product::new("ru", "Placa Drywall RU Resistente a Umidade", categories::DRYWALL, 55.0),
            Product::new("rf", "Perfil F530 Placa", categories::DRYWALL, 12.0),
            Product::new("st", "Placa Drywall ST 12,5mm", categories::DRYWALL, 38.0),
        ]);
        let standard = catalog.by_name_keywords(Some(categories::DRYWALL), &["placa", "st"]);
        assert_eq!(standard.unwrap().id(), "st");
        assert!(catalog.by_name_keywords(None, &["placa", "rf"]).is_none());
        assert_eq!(catalog.by_name_keywords(None, &["resist"]).unwrap().id(), "ru");
    }

    #[test]
    fn test_long_keywords_match_word_prefixes() {
        let catalog = Catalog::new(&[
            Product::new("b", "Baterias Litio 5kWh", categories::BATTERY_BACKUP, 9000.0),
            Product::new("c", "Cabo Solar 6mm", categories::SOLAR, 9.0).with_code("CAB-6MM"),
        ]);
        assert_eq!(catalog.by_name_keywords(None, &["bateria"]).unwrap().id(), "b");
        assert_eq!(catalog.by_name_keywords(None, &["cab", "6mm"]).unwrap().id(), "c");
        assert!(catalog.by_name_keywords(None, &["ab"]).is_none());
    }

    #[test]
    fn test_code_fragment() {
        let catalog = Catalog::new(&[
            Product::new("a", "Perfil", categories::DRYWALL, 10.0).with_code("DRY-F530-3M"),
        ]);
        assert!(catalog.by_code_fragment("f530").is_some());
        assert!(catalog.by_code_fragment("f600").is_none());
    }

    #[test]
    fn test_smallest_adequate_in_band() {
        let catalog = Catalog::new(&[
            inverter("big", 10000.0),
            inverter("small", 3000.0),
            inverter("mid", 5000.0),
        ]);
        let candidates = catalog.by_role(FunctionalRole::Inverter);
        let pick = smallest_adequate(&candidates, 4200.0, 1.3, |e| e.inverter().power_w).unwrap();
        assert_eq!(pick.entry.id(), "mid");
        assert!(pick.within_band);
    }

    #[test]
    fn test_smallest_adequate_closest_fallback() {
        let catalog = Catalog::new(&[inverter("a", 3000.0), inverter("b", 12000.0)]);
        let candidates = catalog.by_role(FunctionalRole::Inverter);
        let pick = smallest_adequate(&candidates, 5000.0, 1.3, |e| e.inverter().power_w).unwrap();
        assert_eq!(pick.entry.id(), "a");
        assert!(!pick.within_band);
    }

    #[test]
    fn test_smallest_adequate_no_ratings() {
        let catalog = Catalog::new(&[Product::new("x", "Inversor", categories::SOLAR, 1.0)
            .with_role(FunctionalRole::Inverter)]);
        let candidates = catalog.by_role(FunctionalRole::Inverter);
        assert!(smallest_adequate(&candidates, 1000.0, 1.3, |e| e.inverter().power_w).is_none());
    }

    #[test]
    fn test_units_for_area_defaults_to_one_square_meter() {
        let entry = CatalogEntry::ingest(Product::new("x", "Sem spec", categories::SHINGLE, 1.0));
        assert_eq!(entry.units_for_area(10.2, 1.0), 11);
    }
}
