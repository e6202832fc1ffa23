//! Bundled menu used when no remote source is configured.

use super::{MenuCollection, MenuItem};

pub fn sample_menu() -> MenuCollection {
    MenuCollection::new(vec![
        MenuItem::new("1", "Margherita Pizza", 11.0)
            .with_description("San Marzano tomato, fior di latte, basil")
            .with_category("Pizza")
            .with_tags(["vegetarian"])
            .with_stock(20)
            .as_featured(),
        MenuItem::new("2", "Diavola Pizza", 13.5)
            .with_description("Spicy salami, chilli oil, mozzarella")
            .with_category("Pizza")
            .with_tags(["spicy"])
            .with_stock(15),
        MenuItem::new("3", "Caesar Salad", 9.0)
            .with_description("Romaine, parmesan, anchovy dressing, croutons")
            .with_category("Salads")
            .with_stock(10),
        MenuItem::new("4", "Tiramisu", 7.0)
            .with_description("Mascarpone, espresso-soaked savoiardi")
            .with_category("Desserts")
            .with_tags(["vegetarian"])
            .with_stock(8)
            .as_featured(),
        MenuItem::new("5", "Sparkling Water", 2.5)
            .with_category("Drinks")
            .with_tags(["vegan", "gluten-free"])
            .with_stock(48),
    ])
}
