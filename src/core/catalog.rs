//! Project-backed master data
//!
//! Implements the estimator's collaborator traits over the YAML records in a
//! project: `materials/items`, `materials/sets` and `rules`.

use crate::core::config::Config;
use crate::core::loader::{find_record, load_all};
use crate::core::project::{Project, RecordDir};
use crate::engine::{MaterialMaster, MaterialSetProvider, ProviderError, RecordKind, RuleSetProvider};
use crate::entities::{MaterialItem, MaterialProperties, MaterialSpecSet, ProductRuleSet};
use crate::yaml::YamlError;

pub struct ProjectCatalog {
    project: Project,
    buying_price_list: String,
}

impl ProjectCatalog {
    pub fn new(project: Project, config: &Config) -> Self {
        Self {
            project,
            buying_price_list: config.buying_price_list().to_string(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn material_sets(&self) -> Vec<MaterialSpecSet> {
        load_all(&self.project, RecordDir::MaterialSets)
            .into_iter()
            .map(|(_, set)| set)
            .collect()
    }

    pub fn rule_sets(&self) -> Vec<ProductRuleSet> {
        load_all(&self.project, RecordDir::RuleSets)
            .into_iter()
            .map(|(_, rules)| rules)
            .collect()
    }

    pub fn items(&self) -> Vec<MaterialItem> {
        load_all(&self.project, RecordDir::MaterialItems)
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }

    pub fn item(&self, code: &str) -> Result<Option<MaterialItem>, ProviderError> {
        find_record(&self.project, RecordDir::MaterialItems, code, |i: &MaterialItem| {
            i.code.as_str()
        })
        .map(|found| found.map(|(_, item)| item))
        .map_err(|e| load_error(RecordKind::Material, code, e))
    }
}

fn load_error(kind: RecordKind, name: &str, err: YamlError) -> ProviderError {
    ProviderError::Load {
        kind,
        name: name.to_string(),
        message: err.to_string(),
    }
}

impl MaterialSetProvider for ProjectCatalog {
    fn material_set(&self, name: &str) -> Result<MaterialSpecSet, ProviderError> {
        find_record(&self.project, RecordDir::MaterialSets, name, |s: &MaterialSpecSet| {
            s.name.as_str()
        })
        .map_err(|e| load_error(RecordKind::MaterialSet, name, e))?
        .map(|(_, set)| set)
        .ok_or_else(|| ProviderError::not_found(RecordKind::MaterialSet, name))
    }
}

impl RuleSetProvider for ProjectCatalog {
    fn rule_set(&self, product: &str) -> Result<ProductRuleSet, ProviderError> {
        find_record(&self.project, RecordDir::RuleSets, product, |r: &ProductRuleSet| {
            r.product.as_str()
        })
        .map_err(|e| load_error(RecordKind::RuleSet, product, e))?
        .map(|(_, rules)| rules)
        .ok_or_else(|| ProviderError::not_found(RecordKind::RuleSet, product))
    }
}

impl MaterialMaster for ProjectCatalog {
    fn properties(&self, material_id: &str) -> Result<Option<MaterialProperties>, ProviderError> {
        Ok(self
            .item(material_id)?
            .map(|item| item.properties(&self.buying_price_list)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ItemPrice, MaterialSource, StockUom};
    use crate::yaml::write_file;
    use tempfile::tempdir;

    fn project_with_data() -> (tempfile::TempDir, ProjectCatalog) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut pipe = MaterialItem::new("Pipe 25mm");
        pipe.stock_uom = Some(StockUom::new("Meter"));
        pipe.weight_per_unit = Some(1.5);
        pipe.prices.push(ItemPrice {
            price_list: "Standard Buying".to_string(),
            rate: 90.0,
        });
        write_file(&project.record_path(RecordDir::MaterialItems, &pipe.code), &pipe).unwrap();

        let set = MaterialSpecSet::new("SS 304").with_binding(MaterialSource::RoundPipe, "Pipe 25mm");
        write_file(&project.record_path(RecordDir::MaterialSets, &set.name), &set).unwrap();

        let rules = ProductRuleSet::new("Stove");
        write_file(&project.record_path(RecordDir::RuleSets, &rules.product), &rules).unwrap();

        let catalog = ProjectCatalog::new(project, &Config::default());
        (tmp, catalog)
    }

    #[test]
    fn test_reads_master_data() {
        let (_tmp, catalog) = project_with_data();

        assert_eq!(catalog.material_set("SS 304").unwrap().name, "SS 304");
        assert_eq!(catalog.rule_set("Stove").unwrap().product, "Stove");

        let props = catalog.properties("Pipe 25mm").unwrap().unwrap();
        assert_eq!(props.weight_per_unit, Some(1.5));
        assert_eq!(props.price_list_rate, Some(90.0));
        assert!(catalog.properties("Unknown").unwrap().is_none());
    }

    #[test]
    fn test_not_found() {
        let (_tmp, catalog) = project_with_data();
        assert!(matches!(
            catalog.material_set("Nope"),
            Err(ProviderError::NotFound { kind: RecordKind::MaterialSet, .. })
        ));
        assert!(matches!(
            catalog.rule_set("Nope"),
            Err(ProviderError::NotFound { kind: RecordKind::RuleSet, .. })
        ));
    }

    #[test]
    fn test_listing() {
        let (_tmp, catalog) = project_with_data();
        assert_eq!(catalog.material_sets().len(), 1);
        assert_eq!(catalog.rule_sets().len(), 1);
        assert_eq!(catalog.items().len(), 1);
    }
}
