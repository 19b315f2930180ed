//! Constants: group names, XMP packet framing, and well-known namespaces.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

// group names used as keys in aggregated metadata dictionaries
pub const XMP: &str = "XMP";
pub const EXIF: &str = "EXIF";
pub const IPTC: &str = "IPTC";
pub const TIFF: &str = "TIFF";
pub const GPS: &str = "GPS";
pub const WEBP: &str = "WEBP";

/// Video key space for QuickTime user data. XMP packets sometimes live here.
pub const UDTA: &str = "udta";

/// Video key space for QuickTime metadata, which holds `Location`.
pub const MDTA: &str = "mdta";

/// The magic `id` attribute value in every XMP packet header.
pub const XMP_PACKET_ID: &str = "W5M0MpCehiHzreSzNTczkc9d";

/// The header line placed before a serialized XMP body.
pub const XMP_PACKET_HEADER: &str =
    "<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>";

/// The footer line placed after a serialized XMP body.
pub const XMP_PACKET_FOOTER: &str = "<?xpacket end=\"w\"?>";

/// This represents the `rdf:` prefix in various collection/container types in
/// XMP through the "RDF/XML" specification.
pub const RDF_NAMESPACE: &str = r"http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// The namespace of the optional `x:xmpmeta` wrapper element.
pub const X_NAMESPACE: &str = r"adobe:ns:meta/";

/// The `xml:` prefix is bound by XML itself and never declared.
pub const XML_NAMESPACE: &str = r"http://www.w3.org/XML/1998/namespace";

/// Prefixes we can declare without being told their URI.
///
/// Keys are prefixes, like `dc`, and values are namespace URIs.
pub static WELL_KNOWN_NAMESPACES: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m: FxHashMap<&'static str, &'static str> = FxHashMap::default();
        map(&mut m);
        m
    });

/// Looks up the URI for a well-known prefix.
pub fn well_known_namespace(prefix: &str) -> Option<&'static str> {
    WELL_KNOWN_NAMESPACES.get(prefix).copied()
}

fn map(m: &mut FxHashMap<&'static str, &'static str>) {
    // rdf and the packet wrapper
    m.insert("rdf", RDF_NAMESPACE);
    m.insert("x", X_NAMESPACE);

    // dublin core
    m.insert("dc", "http://purl.org/dc/elements/1.1/");

    // xmp basic + friends
    {
        m.insert("xmp", "http://ns.adobe.com/xap/1.0/");
        m.insert("xmpMM", "http://ns.adobe.com/xap/1.0/mm/");
        m.insert("xmpBJ", "http://ns.adobe.com/xap/1.0/bj/");
        m.insert("xmpTPg", "http://ns.adobe.com/xap/1.0/t/pg/");
        m.insert("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/");
        m.insert("xmpRights", "http://ns.adobe.com/xap/1.0/rights/");
        m.insert("xmpidq", "http://ns.adobe.com/xmp/Identifier/qual/1.0/");
    }

    // structure types
    {
        m.insert("stEvt", "http://ns.adobe.com/xap/1.0/sType/ResourceEvent#");
        m.insert("stRef", "http://ns.adobe.com/xap/1.0/sType/ResourceRef#");
        m.insert("stDim", "http://ns.adobe.com/xap/1.0/sType/Dimensions#");
        m.insert("stArea", "http://ns.adobe.com/xmp/sType/Area#");
    }

    // camera + image formats
    {
        m.insert("exif", "http://ns.adobe.com/exif/1.0/");
        m.insert("exifEX", "http://cipa.jp/exif/1.0/");
        m.insert("aux", "http://ns.adobe.com/exif/1.0/aux/");
        m.insert("tiff", "http://ns.adobe.com/tiff/1.0/");
        m.insert("crs", "http://ns.adobe.com/camera-raw-settings/1.0/");
        m.insert("pdf", "http://ns.adobe.com/pdf/1.3/");
        m.insert("photoshop", "http://ns.adobe.com/photoshop/1.0/");
        m.insert("lr", "http://ns.adobe.com/lightroom/1.0/");
        m.insert("GPano", "http://ns.google.com/photos/1.0/panorama/");
        m.insert("hdrgm", "http://ns.adobe.com/hdr-gain-map/1.0/");
    }

    // iptc + rights + regions
    {
        m.insert("Iptc4xmpCore", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/");
        m.insert("Iptc4xmpExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/");
        m.insert("plus", "http://ns.useplus.org/ldf/xmp/1.0/");
        m.insert("mwg-rs", "http://www.metadataworkinggroup.com/schemas/regions/");
    }

    // apple
    m.insert("apple-fi", "http://ns.apple.com/faceinfo/1.0/");
}
