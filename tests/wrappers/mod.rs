//! Tests of the wrapper types over the data files in `tests/data/`.

use claims::{assert_ok, assert_some};
use data_fixtures::{
    CsvFixture, FixtureClass, JsonFixture, LoaderRegistry, RowFilter, XPathItem, XmlFixture,
};
use serde_json::json;

use crate::data_dir;

fn load<T: FixtureClass>(file: &str) -> T {
    let data = LoaderRegistry::new()
        .load(&data_dir().join(file))
        .expect("loadable data file");
    T::from_data(data, file).expect("matching data shape")
}

#[test]
fn xml_catalog_queries() {
    let catalog: XmlFixture = load("catalog.xml");

    let book = assert_some!(assert_ok!(catalog.find(".//book[@lang='de']")));
    assert_eq!(book.attribute("id"), Some("bk102"));
    assert_eq!(assert_ok!(catalog.get_text("book/title", "")), "XML Developer's Guide");
    assert_eq!(
        assert_ok!(catalog.xpath("/catalog/book[last()]/@id")),
        vec![XPathItem::Attribute("bk102")]
    );
    assert_eq!(
        catalog.to_dict()["catalog"]["book"][0],
        json!({
            "@id": "bk101",
            "@lang": "en",
            "author": "Gambardella, Matthew",
            "title": "XML Developer's Guide",
            "price": "44.95",
        })
    );
}

#[test]
fn csv_products_filtering() {
    let products: CsvFixture = load("products.csv");

    assert_eq!(products.columns(), vec!["id", "name", "price", "category"]);
    let cheap_electronics = products.filter_rows(
        &RowFilter::new()
            .equals("category", "electronics")
            .matching("price", |price| price.and_then(|p| p.parse::<f64>().ok()).is_some_and(|p| p < 100.0)),
    );
    assert_eq!(cheap_electronics.len(), 1);
    assert_eq!(cheap_electronics[0]["name"], "Mouse");
}

#[test]
fn json_users_rendering() {
    let users: JsonFixture = load("users.json");

    assert_eq!(format!("{users:?}"), r#"JsonFixture("users.json")"#);
    let detailed = users.to_string();
    assert!(detailed.starts_with(r#"JsonFixture(data={"users":"#), "{detailed}");
    assert!(detailed.ends_with(r#"..., description="users.json")"#), "{detailed}");
}
