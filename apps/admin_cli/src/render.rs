//! Plain-text tables for terminal output.

use client_core::{DashboardSnapshot, InboxState, QueryView, SessionUser};
use shared::protocol::{Category, Platform, Product};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn user(user: &SessionUser) {
    println!("id:         {}", user.id);
    println!("username:   {}", user.username);
    println!("full name:  {}", user.full_name.as_deref().unwrap_or("-"));
    println!("admin:      {}", if user.is_admin { "yes" } else { "no" });
    match user.last_login {
        Some(at) => println!("last login: {}", at.format(TIME_FORMAT)),
        None => println!("last login: -"),
    }
}

pub fn product_page(view: &QueryView) {
    if view.items.is_empty() {
        println!("No products match the current filters.");
        return;
    }
    println!(
        "{:>6}  {:<40}  {:>12}  {:>8}  {:<14}  {:<14}",
        "ID", "NAME", "PRICE", "SALES", "CATEGORY", "PLATFORM"
    );
    for product in &view.items {
        println!(
            "{:>6}  {:<40}  {:>12}  {:>8}  {:<14}  {:<14}",
            product.id,
            truncate(&product.name, 40),
            format!("{:.2} {}", product.price, product.currency),
            product.sales_count,
            truncate(&product.category_name, 14),
            truncate(&product.platform_name, 14),
        );
    }
    let pagination = view.state.pagination;
    println!(
        "page {} of {} ({} products, {} per page)",
        pagination.current,
        pagination.page_count(view.total).max(1),
        view.total,
        pagination.page_size
    );
}

pub fn product_detail(product: &Product) {
    println!("id:          {}", product.id);
    println!("name:        {}", product.name);
    println!("url:         {}", product.url);
    println!("price:       {:.2} {}", product.price, product.currency);
    println!("sales:       {}", product.sales_count);
    println!("category:    {} ({})", product.category_name, product.category_id);
    println!("platform:    {} ({})", product.platform_name, product.platform_id);
    if let Some(image_url) = &product.image_url {
        println!("image:       {image_url}");
    }
    if let Some(description) = &product.description {
        println!("description: {description}");
    }
    if product
        .specifications
        .as_object()
        .is_some_and(|specs| !specs.is_empty())
    {
        println!("specifications:");
        for (key, value) in product.specifications.as_object().into_iter().flatten() {
            match value.as_str() {
                Some(text) => println!("  {key}: {text}"),
                None => println!("  {key}: {value}"),
            }
        }
    }
    println!("updated:     {}", product.updated_at.format(TIME_FORMAT));
}

pub fn categories(categories: &[Category]) {
    println!("{:>6}  {:<24}  DESCRIPTION", "ID", "NAME");
    for category in categories {
        println!(
            "{:>6}  {:<24}  {}",
            category.id,
            truncate(&category.name, 24),
            category.description.as_deref().unwrap_or("")
        );
    }
}

pub fn platforms(platforms: &[Platform]) {
    println!("{:>6}  {:<20}  WEBSITE", "ID", "NAME");
    for platform in platforms {
        println!(
            "{:>6}  {:<20}  {}",
            platform.id,
            truncate(&platform.name, 20),
            platform.website
        );
    }
}

pub fn notifications(inbox: &InboxState) {
    println!("{} unread", inbox.unread_count);
    for notification in &inbox.notifications {
        println!(
            "{} #{:<5} {}  {}",
            if notification.is_read { " " } else { "*" },
            notification.id,
            notification.created_at.format(TIME_FORMAT),
            notification.title
        );
        println!("         {}", notification.content);
    }
}

pub fn dashboard(snapshot: &DashboardSnapshot) {
    let stats = &snapshot.stats;
    println!("products:    {}", stats.product_count);
    println!("categories:  {}", stats.category_count);
    println!("platforms:   {}", stats.platform_count);
    println!("added today: {}", stats.today_added);

    for (title, ranking) in [
        ("by platform", &snapshot.platform_ranking),
        ("by category", &snapshot.category_ranking),
    ] {
        println!();
        println!("products {title}:");
        for (name, count) in ranking {
            println!("  {:<24} {count}", truncate(name, 24));
        }
    }

    println!();
    println!("best sellers:");
    if let Some(error) = &snapshot.top_products_error {
        println!("  unavailable: {error}");
    }
    for (rank, product) in snapshot.top_products.iter().enumerate() {
        println!(
            "  {}. {:<40} {} sold",
            rank + 1,
            truncate(&product.name, 40),
            product.sales_count
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
