/// Skin type table and local search filters
use skinguide_mcp::*;

fn product(id: u64, price: f64, skin_types: &[&str]) -> Product {
    Product {
        id,
        name: format!("Product {}", id),
        brand: "Brand".to_string(),
        product_type: "Serum".to_string(),
        price,
        currency: "USD".to_string(),
        size: None,
        image: None,
        link: None,
        country: "US".to_string(),
        skin_types: skin_types.iter().map(|s| s.to_string()).collect(),
        extra: Default::default(),
    }
}

#[test]
fn test_every_code_is_a_valid_axis_combination() {
    for info in &SKIN_TYPES {
        let letters: Vec<char> = info.code.chars().collect();
        assert_eq!(letters.len(), 4);
        assert!("OD".contains(letters[0]), "{}", info.code);
        assert!("SR".contains(letters[1]), "{}", info.code);
        assert!("PN".contains(letters[2]), "{}", info.code);
        assert!("WT".contains(letters[3]), "{}", info.code);
    }
}

#[test]
fn test_lookup_trims_and_ignores_case() {
    assert_eq!(lookup_skin_type(" drnt ").unwrap().difficulty, 1);
    assert!(matches!(lookup_skin_type("ABCD"), Err(DomainError::UnknownSkinType { .. })));
}

#[test]
fn test_full_axis_filter_picks_exact_type() {
    let query = SearchQuery {
        axes: AxisFilter {
            od: Some(Oiliness::Dry),
            sr: Some(Sensitivity::Resistant),
            pn: Some(Pigmentation::NonPigmented),
            wt: Some(Aging::Tight),
        },
        ..Default::default()
    };
    let result = query.apply(vec![
        product(1, 5.0, &["DRNT"]),
        product(2, 5.0, &["DRNW"]),
        product(3, 5.0, &[]),
        product(4, 5.0, &["drnt"]),
    ]);
    let ids: Vec<u64> = result.products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 4]);
}

#[test]
fn test_no_axes_keeps_products_without_skin_types() {
    let result = SearchQuery::default().apply(vec![product(1, 5.0, &[]), product(2, 500.0, &["OSPT"])]);
    assert_eq!(result.total, 2);
}

#[test]
fn test_budget_is_inclusive() {
    let query = SearchQuery {
        budget: Some(20.0),
        ..Default::default()
    };
    let result = query.apply(vec![product(1, 20.0, &[]), product(2, 20.01, &[])]);
    assert_eq!(result.total, 1);
    assert_eq!(result.products[0].id, 1);
}

#[test]
fn test_product_type_list_matches_validation() {
    let list = list_product_types();
    for entry in &list.product_types {
        assert_eq!(validate_product_type(entry.id), Ok(entry.id));
    }
}
