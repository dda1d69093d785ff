use termtree::Tree;

use crate::output::{tree_label, ScanReport};

/// Build the report tree: cameras by display IP, then flaky streams, then open ports.
pub fn report_tree(rep: &ScanReport) -> Tree<String> {
    let mut root = Tree::new(tree_label("Scan report"));

    let mut cameras = Tree::new(tree_label(format!("cameras ({})", rep.cameras.len())));
    for ip in rep.camera_ips() {
        let mut ip_node = Tree::new(tree_label(ip));
        for cam in rep.cameras.iter().filter(|c| c.ip == ip) {
            let mut url_node = Tree::new(cam.url.clone());
            url_node.push(Tree::new(tree_label(format!("image: {}", cam.image.as_str()))));
            if let Some(path) = &cam.thumbnail {
                url_node.push(Tree::new(tree_label(format!("thumbnail: {}", path.display()))));
            }
            ip_node.push(url_node);
        }
        cameras.push(ip_node);
    }
    root.push(cameras);

    if !rep.flaky.is_empty() {
        let mut flaky = Tree::new(tree_label(format!("flaky ({})", rep.flaky.len())));
        for f in &rep.flaky {
            flaky.push(Tree::new(f.url.clone()));
        }
        root.push(flaky);
    }

    let mut portscan = Tree::new(tree_label(format!("portscan ({})", rep.portscan.len())));
    for host in &rep.portscan {
        let label = match &host.hostname {
            Some(hn) => format!("{} ({})", host, hn),
            None => host.to_string(),
        };
        portscan.push(Tree::new(label));
    }
    root.push(portscan);

    if rep.meta.interrupted {
        root.push(Tree::new(tree_label("interrupted: partial results")));
    }
    root
}

/// Print the report tree to stdout.
pub fn print_report_tree(rep: &ScanReport) {
    println!("{}", report_tree(rep));
}
